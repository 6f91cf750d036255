//! Port traits: the hexagonal boundary between the controller core and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Panel inputs, indicators, persistence, the wall clock, the weekly
//! calendar and the web page hooks are all reached through these traits.
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the core never touches hardware directly.

use heapless::String;

use crate::config::SystemConfig;
use crate::drivers::led::Rgb;

// ───────────────────────────────────────────────────────────────
// Panel (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw front-panel inputs, sampled once per cycle.
pub trait SensorPort {
    /// Raw button level, `true` while pressed.
    fn button_pressed(&mut self) -> bool;

    /// One raw plug-sense ADC sample.
    fn plug_sample(&mut self) -> u16;
}

/// Which status indicator an output is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Wifi,
    Charge,
}

/// Write-side port for the two tri-colour indicators.
pub trait IndicatorPort {
    fn set_indicator(&mut self, which: Indicator, rgb: Rgb);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations validate with [`crate::config::validate`] before
/// persisting; out-of-range values are rejected, never clamped.
pub trait ConfigPort {
    /// Load configuration. Returns [`SystemConfig::default()`] if none is stored.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (EEPROM)
// ───────────────────────────────────────────────────────────────

/// Word-addressed write-through persistent store.
pub trait StoragePort {
    /// Number of 16-bit words available.
    fn capacity_words(&self) -> u16;

    fn read_word(&self, addr: u16) -> Result<u16, StorageError>;

    fn write_word(&mut self, addr: u16, value: u16) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Wall clock and weekly calendar
// ───────────────────────────────────────────────────────────────

/// Calendar date and time of day. `year` is the full year (e.g. 2026).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

pub const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

impl DateTime {
    /// Years outside 2000..=2099 are rejected along with impossible dates.
    pub fn is_valid(&self) -> bool {
        (2000..=2099).contains(&self.year)
            && (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    /// 0 = Monday .. 6 = Sunday.
    pub fn weekday(&self) -> u8 {
        // 2000-01-01 was a Saturday
        let mut days: u32 = 0;
        for y in 2000..self.year {
            days += if is_leap_year(y) { 366 } else { 365 };
        }
        for m in 1..self.month {
            days += u32::from(days_in_month(self.year, m));
        }
        days += u32::from(self.day.saturating_sub(1));
        ((days + 5) % 7) as u8
    }

    pub fn seconds_of_day(&self) -> u32 {
        u32::from(self.hour) * 3600 + u32::from(self.minute) * 60 + u32::from(self.second)
    }
}

/// Real-time clock collaborator.
pub trait ClockPort {
    /// Advance the clock; `now_ms` is the monotonic time.
    fn tick(&mut self, now_ms: u32);

    fn now(&self) -> DateTime;

    /// Set the clock. Invalid dates are rejected and leave it unchanged.
    fn set(&mut self, dt: DateTime, now_ms: u32) -> Result<(), ConfigError>;

    /// True until a valid date-time has been set.
    fn is_date_time_lost(&self) -> bool;
}

/// Daily charge window in seconds of day. `start == end` disables the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayWindow {
    pub start_s: u32,
    pub end_s: u32,
}

/// Weekly charge-window collaborator.
pub trait CalendarPort {
    /// Whether charging is allowed at `at`.
    fn is_charge_window_open(&self, at: &DateTime) -> bool;

    /// Window of `weekday` (0 = Monday).
    fn window(&self, weekday: u8) -> DayWindow;

    fn set_window(&mut self, weekday: u8, window: DayWindow) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Web page hooks
// ───────────────────────────────────────────────────────────────

/// Longest SSI answer.
pub const SSI_CAP: usize = 128;

/// Dynamic content served by the Wi-Fi module's web server.
pub trait ContentPort {
    /// Render server-side-include `(p1, p2)` into `out`.
    fn ssi(&mut self, p1: u32, p2: u32, out: &mut String<SSI_CAP>);

    /// Apply form field `(p1, p2)` with its submitted value.
    fn cgi(&mut self, p1: u32, p2: u32, value: &str);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations and value validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Nothing stored yet (first boot).
    NotFound,
    /// Stored blob failed to deserialize.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// The blob does not fit the reserved area.
    StorageFull,
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Word address beyond the device.
    OutOfRange,
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "address out of range"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
