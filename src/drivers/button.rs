//! Front-panel button: level filter with short/long press classification.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up. The raw level is sampled every
//! control cycle; no interrupt is involved.
//!
//! ## Gesture detection
//!
//! | Gesture      | Condition                                   | Event        |
//! |--------------|---------------------------------------------|--------------|
//! | Short press  | Released after less than the long-press time | `ShortPress` |
//! | Long press   | Released after at least the long-press time  | `LongPress`  |
//!
//! A level change is only accepted once the raw level has been stable for
//! the filter window. Events fire on release.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::timer::MsTimer;

/// Button events emitted after gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    ShortPress,
    LongPress,
}

/// Pure filter + classifier, fed with raw levels.
#[derive(Debug, Clone)]
pub struct ButtonFilter {
    raw: bool,
    stable: bool,
    raw_timer: MsTimer,
    press_timer: MsTimer,
    filter_ms: u32,
    long_press_ms: u32,
}

impl ButtonFilter {
    pub fn new(filter_ms: u32, long_press_ms: u32) -> Self {
        Self {
            raw: false,
            stable: false,
            raw_timer: MsTimer::new(),
            press_timer: MsTimer::new(),
            filter_ms,
            long_press_ms,
        }
    }

    /// Feed one raw sample (`true` = pressed).
    pub fn update(&mut self, pressed: bool, now_ms: u32) -> Option<ButtonEvent> {
        if pressed != self.raw {
            self.raw = pressed;
            self.raw_timer.start(now_ms);
            return None;
        }
        if pressed == self.stable || !self.raw_timer.is_expired(now_ms, self.filter_ms) {
            return None;
        }

        self.stable = pressed;
        self.raw_timer.stop();
        if pressed {
            self.press_timer.start(now_ms);
            return None;
        }

        let held_ms = self.press_timer.elapsed(now_ms);
        self.press_timer.stop();
        Some(if held_ms >= self.long_press_ms {
            ButtonEvent::LongPress
        } else {
            ButtonEvent::ShortPress
        })
    }

    /// Filtered level.
    pub fn is_pressed(&self) -> bool {
        self.stable
    }
}

/// Active-low button on an `embedded-hal` input pin.
pub struct ButtonInput<P: InputPin> {
    pin: P,
}

impl<P: InputPin> ButtonInput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Raw pressed level; a read error counts as released.
    pub fn is_pressed(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("button read failed: {:?}", e);
                false
            }
        }
    }
}
