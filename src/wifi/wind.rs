//! Unsolicited `+WIND:` event table.
//!
//! Lines are matched on the numeric code that follows the prefix, first
//! match wins. Each row may set a module flag and may capture the text
//! after the last `:` into a string slot; rows whose kind needs extra
//! handling are dispatched by the engine.

/// Prefix of unsolicited event lines.
pub const WIND_PREFIX: &str = "+WIND:";
/// Prefix of web-form submissions.
pub const CGI_PREFIX: &str = "+CGI:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindKind {
    ConsoleReady,
    PowerOn,
    Reset,
    HardFault,
    WifiUp,
    HwStarted,
    Input,
    CmdMode,
    DataMode,
    SocketConnected,
    SocketDisconnected,
}

/// Module booleans that WIND rows drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiFlag {
    PowerOn,
    ConsoleReady,
    HwStarted,
    WifiUp,
    SocketConnected,
    DataMode,
}

/// String slots filled from WIND content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindSlot {
    /// Address obtained when the link came up.
    LinkIp,
    /// Address of the connected socket client.
    ClientIp,
}

pub struct WindDescriptor {
    pub code: &'static str,
    pub kind: WindKind,
    pub flag: Option<(WifiFlag, bool)>,
    pub slot: Option<WindSlot>,
}

pub static WIND_TABLE: [WindDescriptor; 11] = [
    WindDescriptor {
        code: "0:",
        kind: WindKind::ConsoleReady,
        flag: Some((WifiFlag::ConsoleReady, true)),
        slot: None,
    },
    WindDescriptor {
        code: "1:",
        kind: WindKind::PowerOn,
        flag: Some((WifiFlag::PowerOn, true)),
        slot: None,
    },
    WindDescriptor {
        code: "2:",
        kind: WindKind::Reset,
        flag: None,
        slot: None,
    },
    WindDescriptor {
        code: "8:",
        kind: WindKind::HardFault,
        flag: None,
        slot: None,
    },
    WindDescriptor {
        code: "24:",
        kind: WindKind::WifiUp,
        flag: Some((WifiFlag::WifiUp, true)),
        slot: Some(WindSlot::LinkIp),
    },
    WindDescriptor {
        code: "32:",
        kind: WindKind::HwStarted,
        flag: Some((WifiFlag::HwStarted, true)),
        slot: None,
    },
    WindDescriptor {
        code: "56:",
        kind: WindKind::Input,
        flag: None,
        slot: None,
    },
    WindDescriptor {
        code: "59:",
        kind: WindKind::CmdMode,
        flag: Some((WifiFlag::DataMode, false)),
        slot: None,
    },
    WindDescriptor {
        code: "60:",
        kind: WindKind::DataMode,
        flag: Some((WifiFlag::DataMode, true)),
        slot: None,
    },
    WindDescriptor {
        code: "61:",
        kind: WindKind::SocketConnected,
        flag: Some((WifiFlag::SocketConnected, true)),
        slot: Some(WindSlot::ClientIp),
    },
    WindDescriptor {
        code: "62:",
        kind: WindKind::SocketDisconnected,
        flag: Some((WifiFlag::SocketConnected, false)),
        slot: None,
    },
];

/// Row matching `rest` (the text after [`WIND_PREFIX`]).
pub fn lookup(rest: &str) -> Option<&'static WindDescriptor> {
    WIND_TABLE.iter().find(|d| rest.starts_with(d.code))
}
