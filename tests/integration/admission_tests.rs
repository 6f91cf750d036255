//! Charge-admission FSM driven through its public table and context.

use wallybox::config::SystemConfig;
use wallybox::fsm::context::{ChargeContext, ChargeInputs, ForceLevel};
use wallybox::fsm::states::build_state_table;
use wallybox::fsm::{AdmissionFsm, AdmissionState};

struct Rig {
    fsm: AdmissionFsm,
    ctx: ChargeContext,
    cfg: SystemConfig,
}

impl Rig {
    fn new() -> Self {
        let cfg = SystemConfig::default();
        let mut fsm = AdmissionFsm::new(build_state_table(), AdmissionState::Off);
        let mut ctx = ChargeContext::new(&cfg);
        fsm.start(&mut ctx);
        Self { fsm, ctx, cfg }
    }

    fn tick(&mut self, inputs: ChargeInputs) -> AdmissionState {
        self.ctx.inputs = inputs;
        self.fsm.tick(&mut self.ctx);
        self.fsm.current_state()
    }
}

fn inputs(now_ms: u32, calendar_open: bool, hw_charging: bool, current_ma: i32) -> ChargeInputs {
    ChargeInputs {
        now_ms,
        calendar_open,
        hw_charging,
        current_ma,
        plug_grace: false,
    }
}

#[test]
fn calendar_window_drives_a_normal_session() {
    let mut rig = Rig::new();
    assert_eq!(rig.tick(inputs(0, false, false, 0)), AdmissionState::Off);
    assert!(!rig.ctx.enabled);

    assert_eq!(rig.tick(inputs(10, true, false, 0)), AdmissionState::OnWait);
    assert_eq!(rig.ctx.take_enable_request(), Some(true));

    assert_eq!(rig.tick(inputs(20, true, true, 16_000)), AdmissionState::Charging);
    assert_eq!(rig.ctx.take_enable_request(), None, "already enabled");

    assert_eq!(rig.tick(inputs(30, false, true, 16_000)), AdmissionState::Off);
    assert_eq!(rig.ctx.take_enable_request(), Some(false));
}

#[test]
fn forced_always_ignores_a_closing_calendar() {
    let mut rig = Rig::new();
    rig.ctx.force = ForceLevel::Always;
    assert_eq!(rig.tick(inputs(0, false, false, 0)), AdmissionState::ForceWait);
    assert_eq!(rig.tick(inputs(10, false, true, 500)), AdmissionState::Charging);

    // low current and a closed calendar are both ignored
    let interval = rig.cfg.low_current_interval_ms;
    for n in 1..=4 {
        assert_eq!(
            rig.tick(inputs(10 + n * interval, false, true, 500)),
            AdmissionState::Charging
        );
    }
    assert!(rig.ctx.enabled);
}

#[test]
fn forced_min_current_still_obeys_the_calendar_while_charging() {
    let mut rig = Rig::new();
    rig.ctx.force = ForceLevel::MinCurrentOnly;
    rig.tick(inputs(0, false, false, 0));
    assert_eq!(rig.tick(inputs(10, false, true, 16_000)), AdmissionState::Charging);
    assert_eq!(rig.tick(inputs(20, false, true, 16_000)), AdmissionState::Off);
    assert_eq!(rig.ctx.force, ForceLevel::None, "leaving Charging clears the force");
}

#[test]
fn end_of_charge_needs_two_consecutive_low_samples() {
    let mut rig = Rig::new();
    let interval = rig.cfg.low_current_interval_ms;
    let low = i32::from(rig.cfg.min_stop_current_a) * 1000 - 1;

    rig.tick(inputs(0, true, false, 0));
    assert_eq!(rig.tick(inputs(0, true, true, 16_000)), AdmissionState::Charging);

    // low, high, low: the high sample resets the count
    assert_eq!(rig.tick(inputs(interval, true, true, low)), AdmissionState::Charging);
    assert_eq!(rig.tick(inputs(2 * interval, true, true, 16_000)), AdmissionState::Charging);
    assert_eq!(rig.tick(inputs(3 * interval, true, true, low)), AdmissionState::Charging);

    // samples between intervals do not count
    assert_eq!(rig.tick(inputs(3 * interval + 1, true, true, low)), AdmissionState::Charging);

    assert_eq!(
        rig.tick(inputs(4 * interval, true, true, low)),
        AdmissionState::EndOfChargeLowCurrent
    );
}

#[test]
fn zero_threshold_disables_end_of_charge() {
    let mut rig = Rig::new();
    rig.ctx.min_stop_current_a = 0;
    let interval = rig.cfg.low_current_interval_ms;
    rig.tick(inputs(0, true, false, 0));
    rig.tick(inputs(0, true, true, 0));
    for n in 1..=5 {
        assert_eq!(rig.tick(inputs(n * interval, true, true, 0)), AdmissionState::Charging);
    }
}

#[test]
fn vehicle_pausing_returns_to_wait() {
    let mut rig = Rig::new();
    rig.tick(inputs(0, true, false, 0));
    rig.tick(inputs(10, true, true, 16_000));
    assert_eq!(rig.tick(inputs(20, true, false, 0)), AdmissionState::OnWait);
    assert!(rig.ctx.enabled);
}

#[test]
fn plug_grace_enables_while_off() {
    let mut rig = Rig::new();
    let mut grace = inputs(0, false, false, 0);
    grace.plug_grace = true;
    assert_eq!(rig.tick(grace), AdmissionState::Off);
    assert_eq!(rig.ctx.take_enable_request(), Some(true));

    assert_eq!(rig.tick(inputs(10, false, false, 0)), AdmissionState::Off);
    assert_eq!(rig.ctx.take_enable_request(), Some(false));
}

#[test]
fn end_of_charge_rearms_on_force_or_closes_with_calendar() {
    let mut rig = Rig::new();
    rig.ctx.min_stop_current_a = 80;
    let interval = rig.cfg.low_current_interval_ms;
    rig.tick(inputs(0, true, false, 0));
    rig.tick(inputs(0, true, true, 1_000));
    rig.tick(inputs(interval, true, true, 1_000));
    assert_eq!(
        rig.tick(inputs(2 * interval, true, true, 1_000)),
        AdmissionState::EndOfChargeLowCurrent
    );

    rig.ctx.force = ForceLevel::MinCurrentOnly;
    assert_eq!(rig.tick(inputs(2 * interval + 10, true, true, 1_000)), AdmissionState::ForceWait);
}
