//! Charging status snapshot and the response decoders that fill it.
//!
//! Each decoder scans its fields positionally out of the payload that
//! follows `$OK`. A field whose scan finds no digits keeps its previous
//! value.

use heapless::String;

use crate::ascii::{push_truncated, scan_dec, scan_hex};

/// Plug / pilot state reported by `$GS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlugState {
    Unknown,
    NotConnected,
    Connected,
    Charging,
    Sleeping,
    Disabled,
    Fault(u32),
}

impl PlugState {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Unknown,
            1 => Self::NotConnected,
            2 => Self::Connected,
            3 => Self::Charging,
            0xFE => Self::Sleeping,
            0xFF => Self::Disabled,
            other => Self::Fault(other),
        }
    }
}

/// Latest values reported by the charging hardware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChargeStatus {
    /// Raw EVSE state from `$GS`.
    pub evse_state: u32,
    /// Seconds elapsed in the current charging session.
    pub elapsed_secs: u32,
    /// Measured charging current (mA, signed).
    pub current_ma: i32,
    /// Measured line voltage (mV, signed).
    pub voltage_mv: i32,
    /// Energy delivered in the current session (Wh).
    pub session_wh: u32,
    /// Energy delivered since installation (Wh).
    pub total_wh: u32,
    pub gfci_faults: u32,
    pub no_ground_faults: u32,
    pub stuck_relay_faults: u32,
    pub min_current_a: u32,
    /// Current capacity cap (A).
    pub current_cap_a: u32,
    /// Raw `$G0` connect state.
    pub connect_state: u32,
    pub version: String<16>,
}

impl ChargeStatus {
    pub fn plug_state(&self) -> PlugState {
        PlugState::from_raw(self.evse_state)
    }

    /// Hardware reports current flowing to the vehicle.
    pub fn is_charging(&self) -> bool {
        self.plug_state() == PlugState::Charging
    }
}

fn dec(input: &[u8], cursor: &mut usize, signed: bool) -> Option<i32> {
    let (used, value) = scan_dec(&input[*cursor..], signed, i32::MAX);
    *cursor += used;
    value
}

fn hex(input: &[u8], cursor: &mut usize) -> Option<u32> {
    let (used, value) = scan_hex(&input[*cursor..]);
    *cursor += used;
    value
}

/// `$GS`: `<state hex> <elapsed dec>`
pub fn decode_state(payload: &[u8], st: &mut ChargeStatus) {
    let mut at = 0;
    if let Some(v) = hex(payload, &mut at) {
        st.evse_state = v;
    }
    if let Some(v) = dec(payload, &mut at, false) {
        st.elapsed_secs = v as u32;
    }
}

/// `$GG`: `<milliamps> <millivolts>`
pub fn decode_charge_params(payload: &[u8], st: &mut ChargeStatus) {
    let mut at = 0;
    if let Some(v) = dec(payload, &mut at, true) {
        st.current_ma = v;
    }
    if let Some(v) = dec(payload, &mut at, true) {
        st.voltage_mv = v;
    }
}

/// `$GU`: `<session watt-seconds> <total Wh>`
pub fn decode_energy(payload: &[u8], st: &mut ChargeStatus) {
    let mut at = 0;
    if let Some(ws) = dec(payload, &mut at, false) {
        st.session_wh = ws as u32 / 3600;
    }
    if let Some(wh) = dec(payload, &mut at, false) {
        st.total_wh = wh as u32;
    }
}

/// `$GF`: `<gfci hex> <no-ground hex> <stuck-relay hex>`
pub fn decode_faults(payload: &[u8], st: &mut ChargeStatus) {
    let mut at = 0;
    if let Some(v) = hex(payload, &mut at) {
        st.gfci_faults = v;
    }
    if let Some(v) = hex(payload, &mut at) {
        st.no_ground_faults = v;
    }
    if let Some(v) = hex(payload, &mut at) {
        st.stuck_relay_faults = v;
    }
}

/// `$GC`: `<min amps> <max amps>`
pub fn decode_current_cap(payload: &[u8], st: &mut ChargeStatus) {
    let mut at = 0;
    if let Some(v) = dec(payload, &mut at, false) {
        st.min_current_a = v as u32;
    }
    if let Some(v) = dec(payload, &mut at, false) {
        st.current_cap_a = v as u32;
    }
}

/// `$GV`: `<firmware version> <protocol version>`; keeps the first token.
pub fn decode_version(payload: &[u8], st: &mut ChargeStatus) {
    let text = core::str::from_utf8(payload).unwrap_or("");
    if let Some(token) = text.split_whitespace().next() {
        push_truncated(&mut st.version, token);
    }
}

/// `$G0`: `<connect state>`
pub fn decode_connect_state(payload: &[u8], st: &mut ChargeStatus) {
    let mut at = 0;
    if let Some(v) = dec(payload, &mut at, false) {
        st.connect_state = v as u32;
    }
}
