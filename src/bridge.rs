//! Socket framing bridge.
//!
//! A client connected to the module's socket server sends one request per
//! line and gets one response per request:
//!
//! ```text
//!  request   $<code hex>:<arg>\r\n
//!  response  $<code + 0x80 hex>:<payload>\r\n
//! ```
//!
//! | code | request | response |
//! |------|---------|----------|
//! | `01` | raw AT text for the Wi-Fi module | delayed, the command outcome |
//! | `02` | home SSID | `OK` / `ERR` |
//! | `03` | home password | `OK` / `ERR` |
//! | `04` | restart the Wi-Fi module | `OK`, also while a request is pending |
//! | `05` | device name | the name |
//! | `06` | raw RAPI text for the charging hardware | delayed, the full answer |
//!
//! Only one delayed request may be outstanding; anything else but a
//! restart is answered `BUSY` meanwhile. Each delayed request gets a
//! [`Ticket`] that the engine hands back with its answer, so an answer to
//! a request dropped by a restart is never taken for a later one.

use core::fmt::Write;

use heapless::String;
use log::{debug, warn};

use crate::ascii::hex_value;

/// Longest response line, terminator included.
pub const RESPONSE_CAP: usize = 160;

pub type Response = String<RESPONSE_CAP>;

/// Identifies one delayed request.
pub type Ticket = u32;

pub const CODE_WIFI: u8 = 0x01;
pub const CODE_SET_SSID: u8 = 0x02;
pub const CODE_SET_PASSWORD: u8 = 0x03;
pub const CODE_RESTART: u8 = 0x04;
pub const CODE_NAME: u8 = 0x05;
pub const CODE_RAPI: u8 = 0x06;

/// A decoded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    Wifi(&'a str),
    SetSsid(&'a str),
    SetPassword(&'a str),
    Restart,
    Name,
    Rapi(&'a str),
}

impl Request<'_> {
    pub fn code(&self) -> u8 {
        match self {
            Self::Wifi(_) => CODE_WIFI,
            Self::SetSsid(_) => CODE_SET_SSID,
            Self::SetPassword(_) => CODE_SET_PASSWORD,
            Self::Restart => CODE_RESTART,
            Self::Name => CODE_NAME,
            Self::Rapi(_) => CODE_RAPI,
        }
    }

    /// Requests answered later, when the engine completes.
    pub fn is_delayed(&self) -> bool {
        matches!(self, Self::Wifi(_) | Self::Rapi(_))
    }
}

/// What the owner must do with an incoming line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<'a> {
    /// Send this line back; nothing else to do.
    Reply(Response),
    /// Carry out the request and answer it with [`respond`].
    Execute(Request<'a>),
    /// Hand the request to its engine; the answer goes through
    /// [`SocketBridge::complete`] with the same ticket.
    Defer(Request<'a>, Ticket),
    /// Not a request frame.
    Ignore,
}

/// Split `$XX:arg` into its code and argument. A trailing CR/LF is dropped.
pub fn parse_frame(line: &str) -> Option<(u8, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let bytes = line.as_bytes();
    if bytes.len() < 4 || bytes[0] != b'$' || bytes[3] != b':' {
        return None;
    }
    let hi = hex_value(bytes[1].to_ascii_uppercase())?;
    let lo = hex_value(bytes[2].to_ascii_uppercase())?;
    Some(((hi << 4) | lo, &line[4..]))
}

/// Format a response line for request `code`.
pub fn respond(code: u8, payload: &str) -> Response {
    let mut out = Response::new();
    let _ = write!(out, "${:02X}:", code.wrapping_add(0x80));
    // keep room for the terminator
    for ch in payload.chars() {
        if out.len() + ch.len_utf8() + 2 > RESPONSE_CAP {
            break;
        }
        let _ = out.push(ch);
    }
    let _ = out.push_str("\r\n");
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    code: u8,
    ticket: Ticket,
}

#[derive(Debug, Default)]
pub struct SocketBridge {
    pending: Option<Pending>,
    last_ticket: Ticket,
}

impl SocketBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one line received from the socket client.
    pub fn accept<'a>(&mut self, line: &'a str) -> Decision<'a> {
        let Some((code, arg)) = parse_frame(line) else {
            debug!("BRIDGE: ignoring {:?}", line);
            return Decision::Ignore;
        };

        let request = match code {
            CODE_WIFI => Request::Wifi(arg),
            CODE_SET_SSID => Request::SetSsid(arg),
            CODE_SET_PASSWORD => Request::SetPassword(arg),
            CODE_RESTART => Request::Restart,
            CODE_NAME => Request::Name,
            CODE_RAPI => Request::Rapi(arg),
            other => {
                warn!("BRIDGE: unknown code {:02X}", other);
                return Decision::Reply(respond(other, "ERR"));
            }
        };

        if request == Request::Restart {
            if let Some(p) = self.pending.take() {
                debug!("BRIDGE: restart cancels pending {:02X} #{}", p.code, p.ticket);
            }
            return Decision::Execute(request);
        }
        if self.pending.is_some() {
            return Decision::Reply(respond(code, "BUSY"));
        }
        if !request.is_delayed() {
            return Decision::Execute(request);
        }
        self.last_ticket = self.last_ticket.wrapping_add(1);
        self.pending = Some(Pending {
            code,
            ticket: self.last_ticket,
        });
        Decision::Defer(request, self.last_ticket)
    }

    /// Answer the pending delayed request if it was issued with `code`
    /// under `ticket`.
    pub fn complete(&mut self, code: u8, ticket: Ticket, payload: &str) -> Option<Response> {
        if self.pending != Some(Pending { code, ticket }) {
            debug!("BRIDGE: stale answer {:02X} #{} dropped", code, ticket);
            return None;
        }
        self.pending = None;
        Some(respond(code, payload))
    }

    /// Drop the pending request without answering it, e.g. when the
    /// engine refused to queue it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<u8> {
        self.pending.map(|p| p.code)
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }
}
