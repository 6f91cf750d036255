//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log to the console, show them on the
//! status page, forward them to a client.

use crate::app::ports::DateTime;
use crate::fsm::AdmissionState;
use crate::fsm::context::ForceLevel;
use crate::rapi::status::PlugState;
use crate::wifi::WifiState;

/// Protocol engine an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Wifi,
    Rapi,
}

impl Engine {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Wifi => "WIFI",
            Self::Rapi => "RAPI",
        }
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service started (carries the restored state).
    Started {
        state: AdmissionState,
        force: ForceLevel,
    },

    /// The admission FSM transitioned between states.
    AdmissionChanged {
        from: AdmissionState,
        to: AdmissionState,
    },

    ForceLevelChanged(ForceLevel),

    /// An enable/disable request was queued for the charging hardware.
    EnableChanged(bool),

    WifiStateChanged { from: WifiState, to: WifiState },

    MaintenanceChanged(bool),

    /// The charging-hardware link was reset after exhausting its retries.
    HardwareLinkReset { count: u32 },

    /// A command was dropped because the engine queue was full.
    QueueOverflow(Engine),

    DateTimeSynced(DateTime),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The fatal latch tripped; the controller no longer drives the hardware.
    Fatal(&'static str),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryData {
    pub state: AdmissionState,
    pub force: ForceLevel,
    pub plug: PlugState,
    pub current_ma: i32,
    pub voltage_mv: i32,
    pub session_wh: u32,
    pub total_wh: u32,
    pub wifi: WifiState,
    pub error_total: u32,
}
