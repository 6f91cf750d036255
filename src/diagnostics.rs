//! Error counters and the fatal latch.
//!
//! Recoverable faults are only counted. A fatal condition is a programming
//! error: it latches once, its reason is written to the persistent store so
//! it survives the reset that usually follows, and the service stops
//! driving the hardware.

use core::fmt;

use heapless::String;
use log::error;
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};
use crate::persist::{self, ADDR_FATAL, FATAL_WORDS};

/// Longest persisted fatal reason.
pub const FATAL_REASON_CAP: usize = FATAL_WORDS as usize * 2;

/// Which counter to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    RapiLinkReset,
    RapiQueueFull,
    WifiQueueFull,
    WifiCommandError,
    Storage,
}

/// Counters since start-up, queryable from the status page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounters {
    pub rapi_link_resets: u32,
    pub rapi_queue_full: u32,
    pub wifi_queue_full: u32,
    pub wifi_command_errors: u32,
    pub storage_errors: u32,
}

impl ErrorCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `counter` and return its new value.
    pub fn bump(&mut self, counter: Counter) -> u32 {
        let slot = match counter {
            Counter::RapiLinkReset => &mut self.rapi_link_resets,
            Counter::RapiQueueFull => &mut self.rapi_queue_full,
            Counter::WifiQueueFull => &mut self.wifi_queue_full,
            Counter::WifiCommandError => &mut self.wifi_command_errors,
            Counter::Storage => &mut self.storage_errors,
        };
        *slot = slot.wrapping_add(1);
        *slot
    }

    pub fn total(&self) -> u32 {
        self.rapi_link_resets
            .wrapping_add(self.rapi_queue_full)
            .wrapping_add(self.wifi_queue_full)
            .wrapping_add(self.wifi_command_errors)
            .wrapping_add(self.storage_errors)
    }
}

impl fmt::Display for ErrorCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rapi_resets={} rapi_qfull={} wifi_qfull={} wifi_err={} storage={}",
            self.rapi_link_resets,
            self.rapi_queue_full,
            self.wifi_queue_full,
            self.wifi_command_errors,
            self.storage_errors
        )
    }
}

// ── Fatal latch ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FatalLatch {
    reason: Option<&'static str>,
    at_ms: u32,
}

impl FatalLatch {
    pub const fn new() -> Self {
        Self {
            reason: None,
            at_ms: 0,
        }
    }

    /// Latch `reason`. Only the first call takes effect; returns whether
    /// this call tripped the latch.
    pub fn trip(&mut self, reason: &'static str, now_ms: u32) -> bool {
        if self.reason.is_some() {
            return false;
        }
        error!("FATAL: {} at {} ms", reason, now_ms);
        self.reason = Some(reason);
        self.at_ms = now_ms;
        true
    }

    pub fn is_tripped(&self) -> bool {
        self.reason.is_some()
    }

    pub fn reason(&self) -> Option<&'static str> {
        self.reason
    }

    pub fn tripped_at(&self) -> Option<u32> {
        self.reason.map(|_| self.at_ms)
    }
}

/// Persist a fatal reason, truncated to [`FATAL_REASON_CAP`] bytes.
pub fn record_fatal(store: &mut impl StoragePort, reason: &str) -> Result<(), StorageError> {
    let mut cut = reason.len().min(FATAL_REASON_CAP);
    while !reason.is_char_boundary(cut) {
        cut -= 1;
    }
    persist::save_text(store, ADDR_FATAL, FATAL_WORDS, &reason[..cut])
}

/// Reason recorded before the last reset, if any.
pub fn last_fatal(store: &impl StoragePort) -> Option<String<FATAL_REASON_CAP>> {
    persist::load_text(store, ADDR_FATAL, FATAL_WORDS)
}

pub fn clear_fatal(store: &mut impl StoragePort) -> Result<(), StorageError> {
    persist::write_if_changed(store, ADDR_FATAL, persist::ERASED).map(|_| ())
}
