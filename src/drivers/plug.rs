//! Vehicle plug detection from the averaged plug-sense ADC level.
//!
//! Plugging in starts a grace window during which the admission logic
//! keeps the charging hardware enabled even while admission is off; some
//! vehicles go to sleep when the pilot voltage drops right after plug-in.

use heapless::HistoryBuffer;
use log::info;

use crate::timer::MsTimer;

pub const PLUG_WINDOW: usize = 8;

pub struct PlugDetector {
    samples: HistoryBuffer<u16, PLUG_WINDOW>,
    threshold: u16,
    plugged: bool,
    grace: MsTimer,
    grace_ms: u32,
}

impl PlugDetector {
    pub fn new(threshold: u16, grace_ms: u32) -> Self {
        Self {
            samples: HistoryBuffer::new(),
            threshold,
            plugged: false,
            grace: MsTimer::new(),
            grace_ms,
        }
    }

    /// Add a sample; returns the debounced plugged state.
    pub fn update(&mut self, sample: u16, now_ms: u32) -> bool {
        self.samples.write(sample);
        let plugged = self.mean() >= self.threshold;

        if plugged != self.plugged {
            self.plugged = plugged;
            if plugged {
                info!("PLUG: vehicle connected, grace window {} ms", self.grace_ms);
                self.grace.start(now_ms);
            } else {
                info!("PLUG: vehicle disconnected");
                self.grace.stop();
            }
        }
        plugged
    }

    /// Rolling mean over the samples seen so far (at most the window).
    pub fn mean(&self) -> u16 {
        let n = self.samples.len();
        if n == 0 {
            return 0;
        }
        let sum: u32 = self.samples.as_slice().iter().map(|&s| u32::from(s)).sum();
        (sum / n as u32) as u16
    }

    pub fn is_plugged(&self) -> bool {
        self.plugged
    }

    /// True while the post-plug-in grace window runs.
    pub fn in_grace(&self, now_ms: u32) -> bool {
        self.grace.is_running() && !self.grace.is_expired(now_ms, self.grace_ms)
    }
}
