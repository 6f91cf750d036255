//! Front-panel adapter for the controller board.
//!
//! Owns the button, the plug-sense ADC channel and both indicators and
//! exposes them through [`SensorPort`] and [`IndicatorPort`]. This is the
//! only place that touches panel peripherals.

use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::app::ports::{Indicator, IndicatorPort, SensorPort};
use crate::drivers::button::ButtonInput;
use crate::drivers::led::{Rgb, RgbLed};
use crate::pins;

type LedPin = PinDriver<'static, AnyOutputPin, Output>;

pub struct PanelAdapter {
    button: ButtonInput<PinDriver<'static, AnyIOPin, Input>>,
    wifi_led: RgbLed<LedPin>,
    charge_led: RgbLed<LedPin>,
    adc: adc_oneshot_unit_handle_t,
}

impl PanelAdapter {
    pub fn new(
        button: AnyIOPin,
        wifi_rgb: [AnyOutputPin; 3],
        charge_rgb: [AnyOutputPin; 3],
    ) -> Result<Self, EspError> {
        let mut button = PinDriver::input(button)?;
        button.set_pull(Pull::Up)?;

        let [r, g, b] = wifi_rgb;
        let wifi_led = RgbLed::new(PinDriver::output(r)?, PinDriver::output(g)?, PinDriver::output(b)?);
        let [r, g, b] = charge_rgb;
        let charge_led =
            RgbLed::new(PinDriver::output(r)?, PinDriver::output(g)?, PinDriver::output(b)?);

        let adc = open_plug_adc()?;
        info!("PANEL: ready (plug ADC1 ch{})", pins::PLUG_ADC_CHANNEL);

        Ok(Self {
            button: ButtonInput::new(button),
            wifi_led,
            charge_led,
            adc,
        })
    }
}

fn open_plug_adc() -> Result<adc_oneshot_unit_handle_t, EspError> {
    let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
    let unit = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: called once while building the adapter; `handle` outlives the call.
    esp!(unsafe { adc_oneshot_new_unit(&unit, &mut handle) })?;

    let channel = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    // SAFETY: `handle` was just created by adc_oneshot_new_unit.
    esp!(unsafe { adc_oneshot_config_channel(handle, pins::PLUG_ADC_CHANNEL, &channel) })?;
    Ok(handle)
}

impl SensorPort for PanelAdapter {
    fn button_pressed(&mut self) -> bool {
        self.button.is_pressed()
    }

    /// A failed conversion reads as 0, i.e. unplugged.
    fn plug_sample(&mut self) -> u16 {
        let mut raw: i32 = 0;
        // SAFETY: the handle is owned by this adapter and only used from
        // the control loop.
        let ret = unsafe { adc_oneshot_read(self.adc, pins::PLUG_ADC_CHANNEL, &mut raw) };
        if ret != ESP_OK as i32 {
            return 0;
        }
        raw.max(0) as u16
    }
}

impl IndicatorPort for PanelAdapter {
    fn set_indicator(&mut self, which: Indicator, rgb: Rgb) {
        let led = match which {
            Indicator::Wifi => &mut self.wifi_led,
            Indicator::Charge => &mut self.charge_led,
        };
        if led.current_colour() == rgb {
            return;
        }
        if let Err(e) = led.set_colour(rgb) {
            warn!("PANEL: {:?} indicator write failed: {:?}", which, e);
        }
    }
}
