//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (front-panel
//! button, status page forms, socket bridge) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use heapless::String;

use crate::app::ports::{DateTime, DayWindow};
use crate::config::SystemConfig;
use crate::fsm::context::ForceLevel;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Advance the forced level (short button press).
    CycleForce,

    SetForce(ForceLevel),

    /// Switch the Wi-Fi module between home network and access point
    /// (long button press).
    ToggleMaintenance,

    /// Minimum-stop current in amperes; 0 disables end-of-charge detection.
    SetMinStopCurrent(u8),

    SetWindow { weekday: u8, window: DayWindow },

    SetDateTime(DateTime),

    SetSsid(String<32>),

    SetPassword(String<64>),

    /// Re-run the Wi-Fi module configuration.
    RestartWifi,

    /// Validate, persist and adopt a new configuration. Engine timings
    /// take effect after the next restart.
    UpdateConfig(SystemConfig),

    /// Persist the current configuration immediately.
    SaveConfig,
}
