//! WallyBox firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  PanelAdapter        EepromAdapter     SoftClock             │
//! │  (Sensor+Indicator)  (Storage+Config)  (ClockPort)           │
//! │  WeeklyCalendar      LogEventSink      UartTransport × 2     │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  AppService                                            │  │
//! │  │  WifiEngine · RapiEngine · AdmissionFsm · SocketBridge │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  cooperative loop, one cycle every `cycle_period_ms`         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use wallybox::adapters::calendar::WeeklyCalendar;
use wallybox::adapters::clock::SoftClock;
use wallybox::adapters::eeprom::EepromAdapter;
use wallybox::adapters::hardware::PanelAdapter;
use wallybox::adapters::log_sink::LogEventSink;
use wallybox::adapters::time::MonotonicClock;
use wallybox::adapters::uart::UartTransport;
use wallybox::app::ports::ConfigPort;
use wallybox::app::service::{AppService, Ports};
use wallybox::config::SystemConfig;
use wallybox::drivers::watchdog::Watchdog;
use wallybox::pins;
use wallybox::rapi::RAPI_RX;

/// A control cycle stuck this long resets the controller.
const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  WallyBox v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let pins_in = peripherals.pins;

    // ── 2. Persistent store and configuration ─────────────────
    let partition = EspDefaultNvsPartition::take()?;
    let mut store = EepromAdapter::open(partition).map_err(|e| anyhow!("eeprom: {}", e))?;
    let config = match store.load() {
        Ok(cfg) => {
            info!("Config loaded from store");
            cfg
        }
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Serial links ───────────────────────────────────────
    let wifi_uart = UartTransport::new(
        peripherals.uart1,
        pins_in.gpio17.into(),
        pins_in.gpio18.into(),
        pins::WIFI_UART_BAUD,
    )?;
    let rapi_uart = UartTransport::new(
        peripherals.uart2,
        pins_in.gpio4.into(),
        pins_in.gpio5.into(),
        pins::RAPI_UART_BAUD,
    )?;

    // ── 4. Panel and collaborators ────────────────────────────
    let mut panel = PanelAdapter::new(
        pins_in.gpio16.into(),
        [pins_in.gpio25.into(), pins_in.gpio26.into(), pins_in.gpio27.into()],
        [pins_in.gpio12.into(), pins_in.gpio13.into(), pins_in.gpio14.into()],
    )?;
    let mut clock = SoftClock::new();
    let mut calendar = WeeklyCalendar::new();
    let mut sink = LogEventSink::new();
    let time = MonotonicClock::new();

    // ── 5. Service ────────────────────────────────────────────
    let period_ms = config.cycle_period_ms;
    let mut app = AppService::new(config, wifi_uart, rapi_uart, &RAPI_RX);
    app.start(
        time.now_ms(),
        &mut Ports {
            hw: &mut panel,
            store: &mut store,
            clock: &mut clock,
            calendar: &mut calendar,
            sink: &mut sink,
        },
    );

    let watchdog = Watchdog::subscribe(WATCHDOG_TIMEOUT_MS);
    info!("System ready, cycle {} ms", period_ms);

    // ── 6. Cooperative loop ───────────────────────────────────
    loop {
        let now_ms = time.now_ms();
        app.rapi_mut().transport_mut().pump_into(&RAPI_RX);
        app.cycle(
            now_ms,
            &mut Ports {
                hw: &mut panel,
                store: &mut store,
                clock: &mut clock,
                calendar: &mut calendar,
                sink: &mut sink,
            },
        );
        watchdog.feed();
        FreeRtos::delay_ms(period_ms);
    }
}
