//! RAPI command descriptors.
//!
//! One static row per command kind: wire text, parameter count, the
//! pre-computed checksum for parameterless commands, and the decoder that
//! folds a `$OK` payload into the [`ChargeStatus`] snapshot.

use super::status::{self, ChargeStatus};
use crate::ascii::xor_checksum;

/// Maximum numeric parameters carried by one queue entry.
pub const MAX_PARAMS: usize = 6;

/// Closed set of commands sent to the charging hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RapiKind {
    Enable = 0,
    Disable = 1,
    SetCurrentCap = 2,
    GetState = 3,
    GetChargeParams = 4,
    GetEnergy = 5,
    GetFaults = 6,
    GetCurrentCap = 7,
    GetVersion = 8,
    GetConnectState = 9,
    /// Caller-supplied text from the socket bridge.
    Raw = 10,
}

impl RapiKind {
    pub const COUNT: usize = 11;

    pub fn descriptor(self) -> &'static RapiDescriptor {
        &RAPI_TABLE[self as usize]
    }
}

/// Folds a verified payload (text after `$OK`) into the snapshot.
pub type DecodeFn = fn(&[u8], &mut ChargeStatus);

pub struct RapiDescriptor {
    pub kind: RapiKind,
    /// Command text without parameters and checksum. Empty for `Raw`.
    pub text: &'static str,
    pub param_count: u8,
    /// XOR of `text`, known at build time when the text is constant.
    pub checksum: Option<u8>,
    pub decode: Option<DecodeFn>,
}

const fn fixed_sum(text: &str) -> Option<u8> {
    Some(xor_checksum(text.as_bytes()))
}

pub static RAPI_TABLE: [RapiDescriptor; RapiKind::COUNT] = [
    RapiDescriptor {
        kind: RapiKind::Enable,
        text: "$FE",
        param_count: 0,
        checksum: fixed_sum("$FE"),
        decode: None,
    },
    RapiDescriptor {
        kind: RapiKind::Disable,
        text: "$FD",
        param_count: 0,
        checksum: fixed_sum("$FD"),
        decode: None,
    },
    RapiDescriptor {
        kind: RapiKind::SetCurrentCap,
        text: "$SC",
        param_count: 1,
        checksum: None,
        decode: None,
    },
    RapiDescriptor {
        kind: RapiKind::GetState,
        text: "$GS",
        param_count: 0,
        checksum: fixed_sum("$GS"),
        decode: Some(status::decode_state),
    },
    RapiDescriptor {
        kind: RapiKind::GetChargeParams,
        text: "$GG",
        param_count: 0,
        checksum: fixed_sum("$GG"),
        decode: Some(status::decode_charge_params),
    },
    RapiDescriptor {
        kind: RapiKind::GetEnergy,
        text: "$GU",
        param_count: 0,
        checksum: fixed_sum("$GU"),
        decode: Some(status::decode_energy),
    },
    RapiDescriptor {
        kind: RapiKind::GetFaults,
        text: "$GF",
        param_count: 0,
        checksum: fixed_sum("$GF"),
        decode: Some(status::decode_faults),
    },
    RapiDescriptor {
        kind: RapiKind::GetCurrentCap,
        text: "$GC",
        param_count: 0,
        checksum: fixed_sum("$GC"),
        decode: Some(status::decode_current_cap),
    },
    RapiDescriptor {
        kind: RapiKind::GetVersion,
        text: "$GV",
        param_count: 0,
        checksum: fixed_sum("$GV"),
        decode: Some(status::decode_version),
    },
    RapiDescriptor {
        kind: RapiKind::GetConnectState,
        text: "$G0",
        param_count: 0,
        checksum: fixed_sum("$G0"),
        decode: Some(status::decode_connect_state),
    },
    RapiDescriptor {
        kind: RapiKind::Raw,
        text: "",
        param_count: 0,
        checksum: None,
        decode: None,
    },
];

/// Status queries issued every poll interval, in order.
pub const POLL_SET: [RapiKind; 5] = [
    RapiKind::GetState,
    RapiKind::GetChargeParams,
    RapiKind::GetEnergy,
    RapiKind::GetFaults,
    RapiKind::GetCurrentCap,
];

/// Reset frame text, sent directly after retry exhaustion.
pub const RESET_TEXT: &str = "$FR";

/// One queued command: kind plus its numeric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RapiEntry {
    pub kind: RapiKind,
    pub params: [i32; MAX_PARAMS],
    pub param_len: u8,
}

impl RapiEntry {
    pub fn new(kind: RapiKind) -> Self {
        Self {
            kind,
            params: [0; MAX_PARAMS],
            param_len: 0,
        }
    }

    /// Entry with up to [`MAX_PARAMS`] parameters; extra values are ignored.
    pub fn with_params(kind: RapiKind, params: &[i32]) -> Self {
        let mut entry = Self::new(kind);
        let n = params.len().min(MAX_PARAMS);
        entry.params[..n].copy_from_slice(&params[..n]);
        entry.param_len = n as u8;
        entry
    }

    pub fn params(&self) -> &[i32] {
        &self.params[..self.param_len as usize]
    }
}
