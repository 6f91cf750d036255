//! Function-pointer finite state machine for charge admission.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                        │
//! │  ┌───────────────────────┬──────────┬─────────┬──────────────────┐ │
//! │  │ AdmissionState        │ on_enter │ on_exit │ on_update        │ │
//! │  ├───────────────────────┼──────────┼─────────┼──────────────────┤ │
//! │  │ Off                   │ fn(ctx)  │ -       │ fn(ctx)->Option  │ │
//! │  │ ForceWait             │ fn(ctx)  │ -       │ fn(ctx)->Option  │ │
//! │  │ OnWait                │ fn(ctx)  │ -       │ fn(ctx)->Option  │ │
//! │  │ Charging              │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option  │ │
//! │  │ EndOfChargeLowCurrent │ fn(ctx)  │ -       │ fn(ctx)->Option  │ │
//! │  └───────────────────────┴──────────┴─────────┴──────────────────┘ │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the current state. If it
//! returns `Some(next)`, `on_exit` of the current state and `on_enter` of
//! the next run, in that order. The enable output is written from
//! `on_enter`, so it only changes on a transition edge.

pub mod context;
pub mod indicators;
pub mod states;

use context::ChargeContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Admission states. Must stay in sync with [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AdmissionState {
    Off = 0,
    ForceWait = 1,
    OnWait = 2,
    Charging = 3,
    EndOfChargeLowCurrent = 4,
}

impl AdmissionState {
    pub const COUNT: usize = 5;

    /// Convert a table index back to a state. Out of range asserts in
    /// debug builds and falls back to `Off`, which disables charging.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Off,
            1 => Self::ForceWait,
            2 => Self::OnWait,
            3 => Self::Charging,
            4 => Self::EndOfChargeLowCurrent,
            _ => {
                debug_assert!(false, "invalid admission index: {idx}");
                Self::Off
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::ForceWait => "ForceWait",
            Self::OnWait => "OnWait",
            Self::Charging => "Charging",
            Self::EndOfChargeLowCurrent => "EndOfChargeLowCurrent",
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

pub type StateActionFn = fn(&mut ChargeContext);

/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut ChargeContext) -> Option<AdmissionState>;

pub struct StateDescriptor {
    pub id: AdmissionState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct AdmissionFsm {
    table: [StateDescriptor; AdmissionState::COUNT],
    current: usize,
}

impl AdmissionFsm {
    pub fn new(table: [StateDescriptor; AdmissionState::COUNT], initial: AdmissionState) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table rows out of order"
        );
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter`. Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut ChargeContext) {
        info!("ADMISSION starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance by one cycle. Returns the transition taken, if any.
    pub fn tick(&mut self, ctx: &mut ChargeContext) -> Option<(AdmissionState, AdmissionState)> {
        let from = self.current_state();
        let next = (self.table[self.current].on_update)(ctx)?;
        if next == from {
            return None;
        }
        self.transition(next, ctx);
        Some((from, next))
    }

    pub fn current_state(&self) -> AdmissionState {
        AdmissionState::from_index(self.current)
    }

    fn transition(&mut self, next: AdmissionState, ctx: &mut ChargeContext) {
        let next_idx = next as usize;

        info!(
            "ADMISSION transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::{ChargeContext, ForceLevel};
    use super::*;
    use crate::config::SystemConfig;

    fn make_ctx() -> ChargeContext {
        ChargeContext::new(&SystemConfig::default())
    }

    fn make_fsm() -> AdmissionFsm {
        AdmissionFsm::new(states::build_state_table(), AdmissionState::Off)
    }

    fn started() -> (AdmissionFsm, ChargeContext) {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        (fsm, ctx)
    }

    #[test]
    fn starts_off_and_disabled() {
        let (fsm, mut ctx) = started();
        assert_eq!(fsm.current_state(), AdmissionState::Off);
        assert!(!ctx.enabled);
        assert_eq!(ctx.take_enable_request(), None);
    }

    #[test]
    fn calendar_opens_on_wait_and_enables() {
        let (mut fsm, mut ctx) = started();
        ctx.inputs.calendar_open = true;
        assert_eq!(
            fsm.tick(&mut ctx),
            Some((AdmissionState::Off, AdmissionState::OnWait))
        );
        assert_eq!(ctx.take_enable_request(), Some(true));

        fsm.tick(&mut ctx);
        assert_eq!(ctx.take_enable_request(), None, "no request without an edge");
    }

    #[test]
    fn force_takes_precedence_over_calendar() {
        let (mut fsm, mut ctx) = started();
        ctx.force = ForceLevel::MinCurrentOnly;
        ctx.inputs.calendar_open = true;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), AdmissionState::ForceWait);

        ctx.force = ForceLevel::None;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), AdmissionState::Off);
    }

    #[test]
    fn hardware_charging_enters_charging() {
        let (mut fsm, mut ctx) = started();
        ctx.inputs.calendar_open = true;
        fsm.tick(&mut ctx);
        ctx.inputs.hw_charging = true;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), AdmissionState::Charging);
    }

    #[test]
    fn charging_stops_when_hardware_stops_and_clears_force() {
        let (mut fsm, mut ctx) = started();
        ctx.force = ForceLevel::Always;
        fsm.tick(&mut ctx);
        ctx.inputs.hw_charging = true;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), AdmissionState::Charging);

        ctx.inputs.hw_charging = false;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), AdmissionState::OnWait);
        assert_eq!(ctx.force, ForceLevel::None);
    }

    #[test]
    fn calendar_close_ends_min_current_charge() {
        let (mut fsm, mut ctx) = started();
        ctx.force = ForceLevel::MinCurrentOnly;
        fsm.tick(&mut ctx);
        ctx.inputs.hw_charging = true;
        fsm.tick(&mut ctx);
        ctx.inputs.calendar_open = false;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), AdmissionState::Off);
        assert_eq!(ctx.force, ForceLevel::None);
        assert_eq!(ctx.take_enable_request(), Some(false));
    }

    #[test]
    fn plug_grace_enables_while_off() {
        let (mut fsm, mut ctx) = started();
        ctx.inputs.plug_grace = true;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), AdmissionState::Off);
        assert_eq!(ctx.take_enable_request(), Some(true));
        ctx.inputs.plug_grace = false;
        fsm.tick(&mut ctx);
        assert_eq!(ctx.take_enable_request(), Some(false));
    }

    #[test]
    fn table_rows_are_indexed_by_state() {
        let table = states::build_state_table();
        for (i, row) in table.iter().enumerate() {
            assert_eq!(row.id as usize, i);
            assert_eq!(row.name, row.id.name());
        }
    }

    #[test]
    fn state_from_index_roundtrip() {
        for i in 0..AdmissionState::COUNT {
            assert_eq!(AdmissionState::from_index(i) as usize, i);
        }
    }
}
