//! Indicator patterns derived from the controller state.
//!
//! Both functions are pure; the service recomputes them every cycle and
//! the [`BlinkChannel`](crate::drivers::led::BlinkChannel) keeps the blink
//! phase stable while the result does not change.

use super::AdmissionState;
use super::context::ForceLevel;
use crate::drivers::led::{LedColor, LedPattern};

/// Link-status indicator.
pub fn wifi_pattern(maintenance: bool, hw_link_fault: bool, wifi_connected: bool) -> LedPattern {
    if maintenance {
        LedPattern::blinking(LedColor::Blue)
    } else if hw_link_fault {
        LedPattern::blinking(LedColor::Red)
    } else if wifi_connected {
        LedPattern::solid(LedColor::Blue)
    } else {
        LedPattern::OFF
    }
}

/// Charge-status indicator. A fatal latch wins over everything; a lost
/// date-time is shown unless charging or forced, since the calendar is
/// irrelevant then.
pub fn charge_pattern(
    state: AdmissionState,
    force: ForceLevel,
    fatal: bool,
    date_time_lost: bool,
) -> LedPattern {
    if fatal {
        return LedPattern::blinking(LedColor::Red);
    }
    if date_time_lost && state != AdmissionState::Charging && !force.is_set() {
        return LedPattern::blinking(LedColor::Red);
    }
    match (state, force) {
        (AdmissionState::Charging, _) => LedPattern::solid(LedColor::Green),
        (AdmissionState::ForceWait, ForceLevel::Always) => LedPattern::solid(LedColor::Blue),
        (AdmissionState::ForceWait, ForceLevel::MinCurrentOnly) => {
            LedPattern::blinking(LedColor::Blue)
        }
        (AdmissionState::OnWait, _) => LedPattern::blinking(LedColor::Green),
        _ => LedPattern::OFF,
    }
}
