//! AT command descriptors for the SPWF01S Wi-Fi module.

use heapless::String;
use log::info;

use super::WifiEvent;
use super::time_sync::parse_http_date;
use crate::bridge::Ticket;
use crate::error::WifiError;

/// Longest formatted command, CR included.
pub const CMD_CAP: usize = 128;
/// Largest captured response body.
pub const CAPTURE_CAP: usize = 256;
/// Text carried by bridge and socket events.
pub const EVENT_TEXT_CAP: usize = 128;

pub type EventText = String<EVENT_TEXT_CAP>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WifiKind {
    At = 0,
    Scfg = 1,
    SetSsid = 2,
    Cfun = 3,
    Save = 4,
    FactoryReset = 5,
    Ping = 6,
    SocketServer = 7,
    ToData = 8,
    Scan = 9,
    HttpGet = 10,
    /// Raw text bridged from the socket client.
    Ext = 11,
}

impl WifiKind {
    pub const COUNT: usize = 12;

    pub fn descriptor(self) -> &'static WifiDescriptor {
        &WIFI_TABLE[self as usize]
    }
}

/// Runs on the captured body when a command ends with `OK`.
pub type ResultFn = fn(&str) -> Option<WifiEvent>;

pub struct WifiDescriptor {
    pub kind: WifiKind,
    /// Command text before the comma-separated arguments.
    pub prefix: &'static str,
    pub arg_count: u8,
    /// Maximum captured body length; 0 captures nothing.
    pub capture: usize,
    /// The module reboots on this command, so it is done once sent.
    pub done_on_send: bool,
    pub on_result: Option<ResultFn>,
}

const fn desc(kind: WifiKind, prefix: &'static str, arg_count: u8) -> WifiDescriptor {
    WifiDescriptor {
        kind,
        prefix,
        arg_count,
        capture: 0,
        done_on_send: false,
        on_result: None,
    }
}

const fn capturing(
    kind: WifiKind,
    prefix: &'static str,
    arg_count: u8,
    capture: usize,
    on_result: ResultFn,
) -> WifiDescriptor {
    WifiDescriptor {
        kind,
        prefix,
        arg_count,
        capture,
        done_on_send: false,
        on_result: Some(on_result),
    }
}

pub static WIFI_TABLE: [WifiDescriptor; WifiKind::COUNT] = [
    desc(WifiKind::At, "AT", 0),
    desc(WifiKind::Scfg, "AT+S.SCFG=", 2),
    desc(WifiKind::SetSsid, "AT+S.SSIDTXT=", 1),
    WifiDescriptor {
        done_on_send: true,
        ..desc(WifiKind::Cfun, "AT+CFUN=", 1)
    },
    desc(WifiKind::Save, "AT&W", 0),
    desc(WifiKind::FactoryReset, "AT&F", 0),
    capturing(WifiKind::Ping, "AT+S.PING=", 1, 40, log_ping),
    desc(WifiKind::SocketServer, "AT+S.SOCKD=", 1),
    desc(WifiKind::ToData, "AT+S.", 0),
    capturing(WifiKind::Scan, "AT+S.SCAN", 0, CAPTURE_CAP, log_scan),
    capturing(WifiKind::HttpGet, "AT+S.HTTPGET=", 2, CAPTURE_CAP, time_from_http),
    WifiDescriptor {
        capture: EVENT_TEXT_CAP,
        ..desc(WifiKind::Ext, "", 1)
    },
];

// ── Result handlers ───────────────────────────────────────────

fn log_ping(body: &str) -> Option<WifiEvent> {
    info!("WIFI: gateway answered: {}", body.trim_end());
    None
}

fn log_scan(body: &str) -> Option<WifiEvent> {
    info!("WIFI: scan found {} networks", body.matches("BSS").count());
    None
}

fn time_from_http(body: &str) -> Option<WifiEvent> {
    parse_http_date(body).map(WifiEvent::TimeSync)
}

// ── Queue entry ───────────────────────────────────────────────

/// A fully formatted command waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiEntry {
    pub kind: WifiKind,
    pub text: String<CMD_CAP>,
    /// Set on bridged commands; their outcome is reported under it.
    pub ticket: Option<Ticket>,
}

/// Format `kind` with its arguments: prefix, comma-joined arguments, CR.
/// `Ext` takes its single argument verbatim.
pub fn format_command(kind: WifiKind, args: &[&str]) -> Result<WifiEntry, WifiError> {
    let desc = kind.descriptor();
    let mut text: String<CMD_CAP> = String::new();
    text.push_str(desc.prefix)
        .map_err(|_| WifiError::CommandTooLong)?;

    for (i, arg) in args.iter().take(desc.arg_count as usize).enumerate() {
        if i > 0 {
            text.push(',').map_err(|_| WifiError::CommandTooLong)?;
        }
        text.push_str(arg).map_err(|_| WifiError::CommandTooLong)?;
    }
    if !text.ends_with('\r') {
        text.push('\r').map_err(|_| WifiError::CommandTooLong)?;
    }
    Ok(WifiEntry {
        kind,
        text,
        ticket: None,
    })
}
