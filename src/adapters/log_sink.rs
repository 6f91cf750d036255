//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! tagged line to the logger (UART console in production). Anything that
//! wants to publish events elsewhere implements the same trait.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { state, force } => {
                info!("START | state={} force={}", state.name(), force.name());
            }
            AppEvent::AdmissionChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::ForceLevelChanged(force) => {
                info!("FORCE | {}", force.name());
            }
            AppEvent::EnableChanged(on) => {
                info!("RAPI | enable={}", on);
            }
            AppEvent::WifiStateChanged { from, to } => {
                info!("WIFI | {:?} -> {:?}", from, to);
            }
            AppEvent::MaintenanceChanged(on) => {
                info!("WIFI | maintenance={}", on);
            }
            AppEvent::HardwareLinkReset { count } => {
                warn!("RAPI | link reset #{}", count);
            }
            AppEvent::QueueOverflow(engine) => {
                warn!("{} | command queue full", engine.tag());
            }
            AppEvent::DateTimeSynced(dt) => {
                info!(
                    "CLOCK | {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
                );
            }
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | state={} force={} | plug={:?} | I={}mA U={}mV | \
                     session={}Wh total={}Wh | wifi={:?} | errors={}",
                    t.state.name(),
                    t.force.name(),
                    t.plug,
                    t.current_ma,
                    t.voltage_mv,
                    t.session_wh,
                    t.total_wh,
                    t.wifi,
                    t.error_total,
                );
            }
            AppEvent::Fatal(reason) => {
                error!("FATAL | {}", reason);
            }
        }
    }
}
