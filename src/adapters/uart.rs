//! ESP-IDF UART transports for the two serial modules.
//!
//! The Wi-Fi module is read by the engine itself through
//! [`Transport::read`]. The charging hardware is answered through
//! [`RAPI_RX`](crate::rapi::RAPI_RX): [`UartTransport::pump_into`] moves
//! every received byte into the cell before the engine polls it.

use esp_idf_hal::delay::NON_BLOCK;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::uart::{self, Uart, UartDriver};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::sys::EspError;
use log::info;

use crate::rapi::RapiCell;
use crate::transport::Transport;

pub struct UartTransport<'d> {
    driver: UartDriver<'d>,
    last_write: usize,
}

impl<'d> UartTransport<'d> {
    pub fn new<U: Uart>(
        uart: impl Peripheral<P = U> + 'd,
        tx: AnyIOPin,
        rx: AnyIOPin,
        baud: u32,
    ) -> Result<Self, EspError> {
        let config = uart::config::Config::default().baudrate(Hertz(baud));
        let driver = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &config,
        )?;
        info!("UART: {} baud", baud);
        Ok(Self {
            driver,
            last_write: 0,
        })
    }

    /// Move every byte waiting in the driver into `cell`. Returns the count.
    pub fn pump_into(&mut self, cell: &RapiCell) -> usize {
        let mut buf = [0u8; 64];
        let mut total = 0;
        while let Ok(n) = self.driver.read(&mut buf, NON_BLOCK) {
            if n == 0 {
                break;
            }
            for &byte in &buf[..n] {
                cell.push_byte(byte);
            }
            total += n;
        }
        total
    }
}

impl Transport for UartTransport<'_> {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
        self.driver.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
        let n = self.driver.write(data)?;
        self.last_write = n;
        Ok(n)
    }

    fn is_send_done(&self) -> bool {
        self.driver.wait_tx_done(NON_BLOCK).is_ok()
    }

    /// The driver does not expose its fill level; report the last write
    /// while the transmitter is busy.
    fn remaining_send_bytes(&self) -> usize {
        if self.is_send_done() { 0 } else { self.last_write }
    }
}
