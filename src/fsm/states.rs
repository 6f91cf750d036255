//! Admission state handlers and table builder.
//!
//! `F` forced level, `C` calendar open, `H` hardware charging.
//!
//! ```text
//!  OFF           ─[F set]─▶ FORCE_WAIT   ─[C]─▶ ON_WAIT
//!  FORCE_WAIT    ─[!F]────▶ OFF          ─[H]─▶ CHARGING
//!  ON_WAIT       ─[F set]─▶ FORCE_WAIT   ─[!C]─▶ OFF     ─[H]─▶ CHARGING
//!  CHARGING      ─[!H]────▶ ON_WAIT      ─[F≠Always, !C]─▶ OFF
//!                ─[F=None, two low-current samples]─▶ END_OF_CHARGE
//!  END_OF_CHARGE ─[F set]─▶ FORCE_WAIT   ─[!C]─▶ OFF
//! ```
//!
//! Leaving `Charging` always clears the forced level.

use super::context::{ChargeContext, ForceLevel};
use super::{AdmissionState, StateDescriptor};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; AdmissionState::COUNT] {
    [
        StateDescriptor {
            id: AdmissionState::Off,
            name: "Off",
            on_enter: Some(off_enter),
            on_exit: None,
            on_update: off_update,
        },
        StateDescriptor {
            id: AdmissionState::ForceWait,
            name: "ForceWait",
            on_enter: Some(force_wait_enter),
            on_exit: None,
            on_update: force_wait_update,
        },
        StateDescriptor {
            id: AdmissionState::OnWait,
            name: "OnWait",
            on_enter: Some(on_wait_enter),
            on_exit: None,
            on_update: on_wait_update,
        },
        StateDescriptor {
            id: AdmissionState::Charging,
            name: "Charging",
            on_enter: Some(charging_enter),
            on_exit: Some(charging_exit),
            on_update: charging_update,
        },
        StateDescriptor {
            id: AdmissionState::EndOfChargeLowCurrent,
            name: "EndOfChargeLowCurrent",
            on_enter: Some(end_of_charge_enter),
            on_exit: None,
            on_update: end_of_charge_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF: no admission; enabled only inside the plug-in grace window
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut ChargeContext) {
    ctx.request_enable(ctx.inputs.plug_grace);
}

fn off_update(ctx: &mut ChargeContext) -> Option<AdmissionState> {
    if ctx.force.is_set() {
        return Some(AdmissionState::ForceWait);
    }
    if ctx.inputs.calendar_open {
        return Some(AdmissionState::OnWait);
    }
    ctx.request_enable(ctx.inputs.plug_grace);
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FORCE_WAIT: manual override armed, waiting for the vehicle to draw
// ═══════════════════════════════════════════════════════════════════════════

fn force_wait_enter(ctx: &mut ChargeContext) {
    ctx.request_enable(true);
    info!("ADMISSION: forced ({}), waiting for vehicle", ctx.force.name());
}

fn force_wait_update(ctx: &mut ChargeContext) -> Option<AdmissionState> {
    if !ctx.force.is_set() {
        return Some(AdmissionState::Off);
    }
    if ctx.inputs.hw_charging {
        return Some(AdmissionState::Charging);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ON_WAIT: calendar window open, waiting for the vehicle to draw
// ═══════════════════════════════════════════════════════════════════════════

fn on_wait_enter(ctx: &mut ChargeContext) {
    ctx.request_enable(true);
}

fn on_wait_update(ctx: &mut ChargeContext) -> Option<AdmissionState> {
    if ctx.force.is_set() {
        return Some(AdmissionState::ForceWait);
    }
    if !ctx.inputs.calendar_open {
        return Some(AdmissionState::Off);
    }
    if ctx.inputs.hw_charging {
        return Some(AdmissionState::Charging);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CHARGING
// ═══════════════════════════════════════════════════════════════════════════

fn charging_enter(ctx: &mut ChargeContext) {
    ctx.request_enable(true);
    ctx.low_current_samples = 0;
    ctx.low_current_timer.start(ctx.inputs.now_ms);
}

fn charging_exit(ctx: &mut ChargeContext) {
    ctx.low_current_timer.stop();
    ctx.clear_force();
}

fn charging_update(ctx: &mut ChargeContext) -> Option<AdmissionState> {
    if !ctx.inputs.hw_charging {
        return Some(AdmissionState::OnWait);
    }
    if ctx.force != ForceLevel::Always && !ctx.inputs.calendar_open {
        return Some(AdmissionState::Off);
    }
    if ctx.force == ForceLevel::None && ctx.sample_low_current() {
        info!(
            "ADMISSION: current {} mA below {} A, charge finished",
            ctx.inputs.current_ma, ctx.min_stop_current_a
        );
        return Some(AdmissionState::EndOfChargeLowCurrent);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  END_OF_CHARGE: vehicle stopped drawing; wait for the window to close
// ═══════════════════════════════════════════════════════════════════════════

fn end_of_charge_enter(ctx: &mut ChargeContext) {
    ctx.request_enable(false);
}

fn end_of_charge_update(ctx: &mut ChargeContext) -> Option<AdmissionState> {
    if ctx.force.is_set() {
        return Some(AdmissionState::ForceWait);
    }
    if !ctx.inputs.calendar_open {
        return Some(AdmissionState::Off);
    }
    None
}
