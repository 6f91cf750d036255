//! Weekly charge calendar.
//!
//! One window per weekday in seconds of day. `start == end` disables the
//! day, `start < end` opens `[start, end)`, and `start > end` wraps past
//! midnight: open from `start` until the end of the day and from midnight
//! until `end`.

use log::info;

use crate::app::ports::{CalendarPort, ConfigError, DateTime, DayWindow};

/// Last second of a day.
pub const MAX_SECOND_OF_DAY: u32 = 23 * 3600 + 59 * 60 + 59;

pub struct WeeklyCalendar {
    days: [DayWindow; 7],
}

impl WeeklyCalendar {
    /// Every day disabled.
    pub fn new() -> Self {
        Self {
            days: [DayWindow::default(); 7],
        }
    }
}

impl Default for WeeklyCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarPort for WeeklyCalendar {
    fn is_charge_window_open(&self, at: &DateTime) -> bool {
        let Some(w) = self.days.get(usize::from(at.weekday())) else {
            return false;
        };
        let now = at.seconds_of_day();
        if w.start_s == w.end_s {
            false
        } else if w.start_s < w.end_s {
            now >= w.start_s && now < w.end_s
        } else {
            now >= w.start_s || now < w.end_s
        }
    }

    fn window(&self, weekday: u8) -> DayWindow {
        self.days
            .get(usize::from(weekday))
            .copied()
            .unwrap_or_default()
    }

    fn set_window(&mut self, weekday: u8, window: DayWindow) -> Result<(), ConfigError> {
        if window.start_s > MAX_SECOND_OF_DAY || window.end_s > MAX_SECOND_OF_DAY {
            return Err(ConfigError::ValidationFailed("window beyond 23:59:59"));
        }
        let slot = self
            .days
            .get_mut(usize::from(weekday))
            .ok_or(ConfigError::ValidationFailed("weekday must be 0-6"))?;
        *slot = window;
        info!(
            "CAL: day {} window {}..{} s",
            weekday, window.start_s, window.end_s
        );
        Ok(())
    }
}
