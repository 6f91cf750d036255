//! Tri-colour status indicators.
//!
//! A [`BlinkChannel`] turns a requested [`LedPattern`] into the colour to
//! show right now; an [`RgbLed`] pushes that colour onto three
//! `embedded-hal` output pins. The blink phase restarts only when the
//! requested pattern changes, so recomputing the same pattern every cycle
//! does not disturb the rhythm.

use embedded_hal::digital::OutputPin;

use crate::timer::MsTimer;

/// Colour as (R, G, B), each 0–255. The pin driver treats non-zero as on.
pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Off,
    Red,
    Green,
    Blue,
}

impl LedColor {
    pub const fn rgb(self) -> Rgb {
        match self {
            Self::Off => (0, 0, 0),
            Self::Red => (255, 0, 0),
            Self::Green => (0, 255, 0),
            Self::Blue => (0, 0, 255),
        }
    }
}

/// Requested indicator look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedPattern {
    pub color: LedColor,
    pub blink: bool,
}

impl LedPattern {
    pub const OFF: Self = Self::solid(LedColor::Off);

    pub const fn solid(color: LedColor) -> Self {
        Self { color, blink: false }
    }

    pub const fn blinking(color: LedColor) -> Self {
        Self { color, blink: true }
    }
}

/// Blink state of one indicator.
#[derive(Debug, Clone)]
pub struct BlinkChannel {
    pattern: LedPattern,
    timer: MsTimer,
    lit: bool,
    half_period_ms: u32,
}

impl BlinkChannel {
    pub fn new(half_period_ms: u32) -> Self {
        Self {
            pattern: LedPattern::OFF,
            timer: MsTimer::new(),
            lit: true,
            half_period_ms,
        }
    }

    /// Apply `pattern` and return the colour to display at `now_ms`.
    pub fn update(&mut self, pattern: LedPattern, now_ms: u32) -> Rgb {
        if pattern != self.pattern {
            self.pattern = pattern;
            self.lit = true;
            self.timer.start(now_ms);
        } else if pattern.blink && self.timer.is_expired(now_ms, self.half_period_ms) {
            self.lit = !self.lit;
            self.timer.start(now_ms);
        }

        if self.lit || !pattern.blink {
            pattern.color.rgb()
        } else {
            LedColor::Off.rgb()
        }
    }

    pub fn pattern(&self) -> LedPattern {
        self.pattern
    }
}

/// Three discrete LEDs (or a common-cathode RGB LED) on output pins.
pub struct RgbLed<P: OutputPin> {
    red: P,
    green: P,
    blue: P,
    current: Rgb,
}

impl<P: OutputPin> RgbLed<P> {
    pub fn new(red: P, green: P, blue: P) -> Self {
        Self {
            red,
            green,
            blue,
            current: LedColor::Off.rgb(),
        }
    }

    pub fn set_colour(&mut self, rgb: Rgb) -> Result<(), P::Error> {
        self.red.set_state((rgb.0 != 0).into())?;
        self.green.set_state((rgb.1 != 0).into())?;
        self.blue.set_state((rgb.2 != 0).into())?;
        self.current = rgb;
        Ok(())
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }
}
