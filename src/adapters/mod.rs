//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                  | Connects to                 |
//! |-------------|-----------------------------|-----------------------------|
//! | `calendar`  | CalendarPort                | weekly charge windows       |
//! | `clock`     | ClockPort                   | soft RTC on monotonic time  |
//! | `eeprom`    | StoragePort, ConfigPort     | word store (NVS blob on target) |
//! | `hardware`  | SensorPort, IndicatorPort   | button, plug ADC, RGB LEDs  |
//! | `html_info` | ContentPort                 | Wi-Fi module web server     |
//! | `log_sink`  | EventSink                   | serial log output           |
//! | `time`      | -                           | monotonic millisecond clock |
//! | `uart`      | Transport                   | ESP-IDF UART driver         |

pub mod calendar;
pub mod clock;
pub mod eeprom;
#[cfg(target_os = "espidf")]
pub mod hardware;
pub mod html_info;
pub mod log_sink;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
