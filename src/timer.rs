//! Millisecond tempo built on a free-running `u32` tick.
//!
//! Every comparison uses `wrapping_sub`, so a timer started just before
//! the counter wraps (~49.7 days) still expires on time.

/// A restartable millisecond timer. `None` means stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MsTimer {
    started_at: Option<u32>,
}

impl MsTimer {
    pub const fn new() -> Self {
        Self { started_at: None }
    }

    /// (Re)start the timer at `now_ms`.
    pub fn start(&mut self, now_ms: u32) {
        self.started_at = Some(now_ms);
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Milliseconds since `start`; 0 when stopped.
    pub fn elapsed(&self, now_ms: u32) -> u32 {
        self.started_at.map_or(0, |t| now_ms.wrapping_sub(t))
    }

    /// True once `duration_ms` has elapsed. A stopped timer never expires.
    pub fn is_expired(&self, now_ms: u32, duration_ms: u32) -> bool {
        self.started_at
            .is_some_and(|t| now_ms.wrapping_sub(t) >= duration_ms)
    }

    /// Milliseconds left before expiry; 0 when expired or stopped.
    pub fn remaining(&self, now_ms: u32, duration_ms: u32) -> u32 {
        match self.started_at {
            Some(t) => duration_ms.saturating_sub(now_ms.wrapping_sub(t)),
            None => 0,
        }
    }
}
