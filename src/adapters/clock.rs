//! Software real-time clock.
//!
//! Keeps a calendar date-time advanced from the monotonic millisecond
//! counter. Until the first valid `set` the date-time counts as lost and
//! the calendar refuses to open.

use log::info;

use crate::app::ports::{ClockPort, ConfigError, DateTime, days_in_month};

pub struct SoftClock {
    now: DateTime,
    last_ms: u32,
    sub_ms: u32,
    lost: bool,
}

impl SoftClock {
    /// Starts at 2000-01-01 00:00:00 with the date-time lost.
    pub fn new() -> Self {
        Self {
            now: DateTime {
                year: 2000,
                month: 1,
                day: 1,
                ..DateTime::default()
            },
            last_ms: 0,
            sub_ms: 0,
            lost: true,
        }
    }
}

impl Default for SoftClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Advance `dt` by `secs`, carrying into days, months and years.
pub fn add_seconds(dt: &mut DateTime, secs: u32) {
    let total = dt.seconds_of_day() + secs;
    let mut days = total / 86_400;
    let rem = total % 86_400;
    dt.hour = (rem / 3600) as u8;
    dt.minute = (rem % 3600 / 60) as u8;
    dt.second = (rem % 60) as u8;

    while days > 0 {
        days -= 1;
        if dt.day < days_in_month(dt.year, dt.month) {
            dt.day += 1;
        } else if dt.month < 12 {
            dt.day = 1;
            dt.month += 1;
        } else {
            dt.day = 1;
            dt.month = 1;
            dt.year += 1;
        }
    }
}

impl ClockPort for SoftClock {
    fn tick(&mut self, now_ms: u32) {
        let elapsed = now_ms.wrapping_sub(self.last_ms).wrapping_add(self.sub_ms);
        self.last_ms = now_ms;
        self.sub_ms = elapsed % 1000;
        let secs = elapsed / 1000;
        if secs > 0 {
            add_seconds(&mut self.now, secs);
        }
    }

    fn now(&self) -> DateTime {
        self.now
    }

    fn set(&mut self, dt: DateTime, now_ms: u32) -> Result<(), ConfigError> {
        if !dt.is_valid() {
            return Err(ConfigError::ValidationFailed("invalid date-time"));
        }
        self.now = dt;
        self.last_ms = now_ms;
        self.sub_ms = 0;
        if self.lost {
            info!(
                "CLOCK: set to {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
            );
        }
        self.lost = false;
        Ok(())
    }

    fn is_date_time_lost(&self) -> bool {
        self.lost
    }
}
