//! Shared mutable context threaded through every admission handler.
//!
//! `ChargeContext` is the blackboard the state handlers read inputs from
//! and write decisions to: the forced level, the per-cycle inputs, the
//! enable output and the end-of-charge sampler.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::timer::MsTimer;

// ---------------------------------------------------------------------------
// Forced level
// ---------------------------------------------------------------------------

/// Manual override axis. An input to the FSM, not one of its states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ForceLevel {
    #[default]
    None = 0,
    /// Charge regardless of the calendar, stop on low current.
    MinCurrentOnly = 1,
    /// Charge regardless of the calendar and of the current.
    Always = 2,
}

impl ForceLevel {
    /// Short-press cycle: `None → MinCurrentOnly → Always → None`.
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::MinCurrentOnly,
            Self::MinCurrentOnly => Self::Always,
            Self::Always => Self::None,
        }
    }

    pub fn is_set(self) -> bool {
        self != Self::None
    }

    pub fn from_word(word: u16) -> Option<Self> {
        match word {
            0 => Some(Self::None),
            1 => Some(Self::MinCurrentOnly),
            2 => Some(Self::Always),
            _ => None,
        }
    }

    pub fn as_word(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::MinCurrentOnly => "MinCurrentOnly",
            Self::Always => "Always",
        }
    }
}

// ---------------------------------------------------------------------------
// Per-cycle inputs (written by the service before each tick)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChargeInputs {
    /// Monotonic time of this cycle.
    pub now_ms: u32,
    /// Calendar allows charging now (always false while date-time is lost).
    pub calendar_open: bool,
    /// Hardware reports an active charge.
    pub hw_charging: bool,
    /// Measured charge current (mA).
    pub current_ma: i32,
    /// Post-plug-in grace window running.
    pub plug_grace: bool,
}

// ---------------------------------------------------------------------------
// ChargeContext
// ---------------------------------------------------------------------------

pub struct ChargeContext {
    // -- Inputs --
    pub inputs: ChargeInputs,
    pub force: ForceLevel,

    // -- Output --
    /// Level last requested from the hardware.
    pub enabled: bool,
    /// Pending enable change for the hardware engine, taken by the service.
    pub enable_request: Option<bool>,

    // -- End-of-charge sampler --
    pub low_current_samples: u8,
    pub low_current_timer: MsTimer,
    pub min_stop_current_a: u8,
    pub low_current_interval_ms: u32,
}

impl ChargeContext {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            inputs: ChargeInputs::default(),
            force: ForceLevel::None,
            enabled: false,
            enable_request: None,
            low_current_samples: 0,
            low_current_timer: MsTimer::new(),
            min_stop_current_a: config.min_stop_current_a,
            low_current_interval_ms: config.low_current_interval_ms,
        }
    }

    /// Request an enable level; only a change produces a request.
    pub fn request_enable(&mut self, enable: bool) {
        if enable != self.enabled {
            self.enabled = enable;
            self.enable_request = Some(enable);
        }
    }

    /// Re-issue the current level, e.g. after the hardware link was reset.
    pub fn resync_enable(&mut self) {
        self.enable_request = Some(self.enabled);
    }

    pub fn take_enable_request(&mut self) -> Option<bool> {
        self.enable_request.take()
    }

    pub fn clear_force(&mut self) {
        if self.force.is_set() {
            info!("ADMISSION: forced level {} cleared", self.force.name());
            self.force = ForceLevel::None;
        }
    }

    /// Sample the current once per interval. Returns true after two
    /// consecutive samples below the minimum-stop threshold. A threshold
    /// of 0 disables the check.
    pub fn sample_low_current(&mut self) -> bool {
        if self.min_stop_current_a == 0 {
            return false;
        }
        let now = self.inputs.now_ms;
        if !self
            .low_current_timer
            .is_expired(now, self.low_current_interval_ms)
        {
            return false;
        }
        self.low_current_timer.start(now);

        let limit_ma = i32::from(self.min_stop_current_a) * 1000;
        if self.inputs.current_ma < limit_ma {
            self.low_current_samples = self.low_current_samples.saturating_add(1);
        } else {
            self.low_current_samples = 0;
        }
        self.low_current_samples >= 2
    }
}
