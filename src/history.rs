//! Recent admission states, kept for diagnostics only.
//!
//! Nothing in the control path reads the history; it is rendered on the
//! status page and in the diagnostics log.

use core::fmt::Write;

use heapless::{HistoryBuffer, String};

use crate::fsm::AdmissionState;

pub const HISTORY_DEPTH: usize = 10;

/// Ring of the last [`HISTORY_DEPTH`] admission states; the oldest entry
/// is overwritten.
pub struct StateHistory {
    ring: HistoryBuffer<AdmissionState, HISTORY_DEPTH>,
}

impl StateHistory {
    pub fn new() -> Self {
        Self {
            ring: HistoryBuffer::new(),
        }
    }

    pub fn clear(&mut self) {
        self.ring.clear();
    }

    pub fn push(&mut self, state: AdmissionState) {
        self.ring.write(state);
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    pub fn latest(&self) -> Option<AdmissionState> {
        self.ring.recent().copied()
    }

    /// States, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = AdmissionState> + '_ {
        self.ring.oldest_ordered().copied()
    }

    /// Render as `Off>OnWait>Charging`, oldest first. When the buffer is
    /// too small the output stops before the first state that does not
    /// fit whole.
    pub fn render<const N: usize>(&self, out: &mut String<N>) {
        out.clear();
        for (i, state) in self.iter().enumerate() {
            let sep = if i == 0 { "" } else { ">" };
            let needed = sep.len() + state.name().len();
            if out.len() + needed > N {
                break;
            }
            let _ = write!(out, "{}{}", sep, state.name());
        }
    }
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_oldest_first() {
        let mut h = StateHistory::new();
        h.push(AdmissionState::Off);
        h.push(AdmissionState::OnWait);
        h.push(AdmissionState::Charging);
        let mut s: String<64> = String::new();
        h.render(&mut s);
        assert_eq!(s.as_str(), "Off>OnWait>Charging");
        assert_eq!(h.latest(), Some(AdmissionState::Charging));
    }

    #[test]
    fn overwrites_oldest() {
        let mut h = StateHistory::new();
        h.push(AdmissionState::ForceWait);
        for _ in 0..HISTORY_DEPTH {
            h.push(AdmissionState::Off);
        }
        assert_eq!(h.len(), HISTORY_DEPTH);
        assert!(h.iter().all(|s| s == AdmissionState::Off));
    }

    #[test]
    fn truncates_at_state_boundary() {
        let mut h = StateHistory::new();
        h.push(AdmissionState::Off);
        h.push(AdmissionState::Charging);
        let mut s: String<10> = String::new();
        h.render(&mut s);
        assert_eq!(s.as_str(), "Off");
    }

    #[test]
    fn empty_renders_nothing() {
        let h = StateHistory::new();
        let mut s: String<16> = String::new();
        h.render(&mut s);
        assert!(s.is_empty());
        assert!(h.is_empty());
    }
}
