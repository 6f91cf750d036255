//! SPWF01S Wi-Fi module engine.
//!
//! ```text
//!   Off ──(power-on, console, hw-started)──▶ Idle
//!    ▲                                        │ configuration queued
//!    │ module reset                           ▼
//!    └──────────────────────────────────  Connecting ──(link up + SOCKD)──▶ Connected
//! ```
//!
//! Lines from the module are read with a two-phase read each cycle: first
//! complete CRLF lines, and only if none is available, a pending read of
//! the unterminated buffer. The pending read never consumes data; it lets
//! SSI requests be answered before the module terminates them.
//!
//! At most one AT command is outstanding. The queue head is released as
//! soon as it is sent; its outcome is an `OK` line, an `ERROR` line or a
//! response timeout. The outcome stays visible for one cycle and then
//! collapses back to [`CmdStatus::Idle`].

pub mod command;
pub mod time_sync;
pub mod wind;

use heapless::{Deque, String, Vec};
use log::{debug, error, info, warn};

use crate::app::ports::{ContentPort, DateTime, SSI_CAP};
use crate::ascii::{push_truncated, rsplit_last, scan_dec};
use crate::bridge::Ticket;
use crate::config::SystemConfig;
use crate::error::{Error, WifiError};
use crate::queue::CommandQueue;
use crate::timer::MsTimer;
use crate::transport::{LineBuffer, Transport};

use command::{CAPTURE_CAP, EventText, WifiEntry, WifiKind, format_command};
use wind::{CGI_PREFIX, WIND_PREFIX, WifiFlag, WindKind, WindSlot};

/// Queue slots; one stays empty.
pub const QUEUE_SLOTS: usize = 8;
/// Receive accumulation buffer.
pub const RX_CAP: usize = 1024;
/// Longest line handed to the dispatcher.
pub const LINE_CAP: usize = 512;
/// Outbound socket payload buffer.
pub const SOCKET_TX_CAP: usize = 256;
/// Polls of `is_send_done` an inline answer may wait.
pub const INLINE_SPIN_LIMIT: u32 = 1000;

/// Failed configuration runs before the module is factory reset.
pub const CONFIG_FAILURES_BEFORE_RESET: u8 = 3;

/// Sent in data mode to return the module to command mode.
pub const ESCAPE_SEQUENCE: &[u8] = b"at+s.";

const EVENT_CAP: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Off,
    Idle,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdStatus {
    Idle,
    Processing,
    DoneOk,
    DoneError,
}

/// Module booleans reported through WIND events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WifiFlags {
    pub power_on: bool,
    pub console_ready: bool,
    pub hw_started: bool,
    pub wifi_up: bool,
    pub socket_connected: bool,
    pub data_mode: bool,
}

impl WifiFlags {
    pub fn set(&mut self, flag: WifiFlag, value: bool) {
        match flag {
            WifiFlag::PowerOn => self.power_on = value,
            WifiFlag::ConsoleReady => self.console_ready = value,
            WifiFlag::HwStarted => self.hw_started = value,
            WifiFlag::WifiUp => self.wifi_up = value,
            WifiFlag::SocketConnected => self.socket_connected = value,
            WifiFlag::DataMode => self.data_mode = value,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.power_on && self.console_ready && self.hw_started
    }
}

/// Notifications produced by [`WifiEngine::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiEvent {
    StateChanged { from: WifiState, to: WifiState },
    /// A line received from the socket client, CRLF removed.
    SocketFrame(EventText),
    /// Outcome of a bridged command: captured text, `OK`, `ERROR` or `Timeout`.
    BridgeResponse { ticket: Ticket, text: EventText },
    TimeSync(DateTime),
    QueueFull,
    Fatal(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct WifiTiming {
    cmd_timeout_ms: u32,
    housekeeping_ms: u32,
    data_idle_ms: u32,
    maintenance_ms: u32,
}

pub struct WifiEngine<T: Transport> {
    transport: T,
    rx: LineBuffer<RX_CAP>,
    queue: CommandQueue<WifiEntry, QUEUE_SLOTS>,
    state: WifiState,
    status: CmdStatus,
    current: Option<WifiKind>,
    current_ticket: Option<Ticket>,
    capture: String<CAPTURE_CAP>,
    flags: WifiFlags,
    link_ip: String<32>,
    client_ip: String<16>,
    ssid: String<32>,
    password: String<64>,
    maint_ssid: String<32>,
    listen_port: String<6>,
    time_host: String<32>,
    time_path: String<32>,
    gateway: String<32>,
    config_sent: bool,
    config_failures: u8,
    config_step: usize,
    maintenance: bool,
    ssi_answered: bool,
    data_requested: bool,
    escape_sent: bool,
    command_errors: u32,
    socket_tx: Vec<u8, SOCKET_TX_CAP>,
    cmd_timer: MsTimer,
    housekeeping_timer: MsTimer,
    data_idle_timer: MsTimer,
    maintenance_timer: MsTimer,
    events: Deque<WifiEvent, EVENT_CAP>,
    timing: WifiTiming,
}

impl<T: Transport> WifiEngine<T> {
    pub fn new(transport: T, config: &SystemConfig) -> Self {
        let mut listen_port = String::new();
        let _ = core::fmt::write(&mut listen_port, format_args!("{}", config.listen_port));
        let mut maint_ssid = String::new();
        push_truncated(&mut maint_ssid, &config.maintenance_ssid);
        let mut time_host = String::new();
        push_truncated(&mut time_host, &config.time_sync_host);
        let mut time_path = String::new();
        push_truncated(&mut time_path, &config.time_sync_path);
        let mut gateway = String::new();
        push_truncated(&mut gateway, &config.gateway_host);

        Self {
            transport,
            rx: LineBuffer::new(),
            queue: CommandQueue::new(),
            state: WifiState::Off,
            status: CmdStatus::Idle,
            current: None,
            current_ticket: None,
            capture: String::new(),
            flags: WifiFlags::default(),
            link_ip: String::new(),
            client_ip: String::new(),
            ssid: String::new(),
            password: String::new(),
            maint_ssid,
            listen_port,
            time_host,
            time_path,
            gateway,
            config_sent: false,
            config_failures: 0,
            config_step: 0,
            maintenance: false,
            ssi_answered: false,
            data_requested: false,
            escape_sent: false,
            command_errors: 0,
            socket_tx: Vec::new(),
            cmd_timer: MsTimer::new(),
            housekeeping_timer: MsTimer::new(),
            data_idle_timer: MsTimer::new(),
            maintenance_timer: MsTimer::new(),
            events: Deque::new(),
            timing: WifiTiming {
                cmd_timeout_ms: config.wifi_cmd_timeout_ms,
                housekeeping_ms: config.wifi_housekeeping_ms,
                data_idle_ms: config.data_mode_idle_ms,
                maintenance_ms: config.maintenance_timeout_ms,
            },
        }
    }

    /// Home-network credentials used by the next configuration run.
    pub fn set_credentials(&mut self, ssid: &str, password: &str) {
        self.set_ssid(ssid);
        self.set_password(password);
    }

    pub fn set_ssid(&mut self, ssid: &str) {
        push_truncated(&mut self.ssid, ssid);
    }

    pub fn set_password(&mut self, password: &str) {
        push_truncated(&mut self.password, password);
    }

    // ── Producer side ─────────────────────────────────────────

    /// Format and queue a command.
    pub fn enqueue(&mut self, kind: WifiKind, args: &[&str]) -> Result<(), Error> {
        let entry = format_command(kind, args)?;
        self.push_entry(entry)
    }

    /// Queue raw AT text from the bridge. Its outcome arrives as
    /// [`WifiEvent::BridgeResponse`] with `ticket`.
    pub fn enqueue_ext(&mut self, text: &str, ticket: Ticket) -> Result<(), Error> {
        let mut entry = format_command(WifiKind::Ext, &[text])?;
        entry.ticket = Some(ticket);
        self.push_entry(entry)
    }

    fn push_entry(&mut self, entry: WifiEntry) -> Result<(), Error> {
        let kind = entry.kind;
        if self.queue.enqueue(entry).is_err() {
            warn!("WIFI: queue full, {:?} dropped", kind);
            self.push_event(WifiEvent::QueueFull);
            return Err(crate::error::QueueFull.into());
        }
        Ok(())
    }

    /// Empty the queue. Bridged commands in it are answered `ERROR`.
    fn clear_queue(&mut self) {
        while let Some(entry) = self.queue.commit() {
            if let Some(ticket) = entry.ticket {
                self.push_bridge(ticket, "ERROR");
            }
        }
    }

    /// Buffer payload for the socket client; it goes out in data mode.
    pub fn send_socket(&mut self, data: &[u8]) -> Result<(), WifiError> {
        if !self.flags.socket_connected {
            return Err(WifiError::NotReady);
        }
        self.socket_tx
            .extend_from_slice(data)
            .map_err(|_| WifiError::DataOverflow)
    }

    /// Switch between home network and stand-alone access point.
    pub fn set_maintenance(&mut self, on: bool, now_ms: u32) {
        if self.maintenance == on {
            return;
        }
        self.maintenance = on;
        if on {
            self.maintenance_timer.start(now_ms);
        } else {
            self.maintenance_timer.stop();
        }
        info!("WIFI: maintenance mode {}", if on { "on" } else { "off" });
        self.reconfigure();
    }

    pub fn toggle_maintenance(&mut self, now_ms: u32) {
        self.set_maintenance(!self.maintenance, now_ms);
    }

    /// Re-run configuration, e.g. after new credentials.
    pub fn restart(&mut self) {
        info!("WIFI: restart requested");
        self.reconfigure();
    }

    fn reconfigure(&mut self) {
        self.clear_queue();
        self.config_sent = false;
        self.config_step = 0;
        if self.flags.data_mode {
            self.write_escape();
        }
        self.flags.wifi_up = false;
        self.flags.socket_connected = false;
        self.flags.data_mode = false;
        self.data_requested = false;
        self.socket_tx.clear();
        if self.state != WifiState::Off {
            self.set_state(WifiState::Idle);
        }
    }

    // ── Poll routine ──────────────────────────────────────────

    /// Advance the engine. Call every cycle; never blocks except for the
    /// bounded wait of an inline answer.
    pub fn poll(&mut self, now_ms: u32, content: &mut impl ContentPort) {
        self.process_rx(now_ms, content);

        if self.maintenance
            && self
                .maintenance_timer
                .is_expired(now_ms, self.timing.maintenance_ms)
        {
            info!("WIFI: maintenance timed out");
            self.set_maintenance(false, now_ms);
        }

        self.collapse_status();
        self.step_state(now_ms);
        self.step_data_mode(now_ms);
        self.send_next(now_ms);
    }

    fn process_rx(&mut self, now_ms: u32, content: &mut impl ContentPort) {
        loop {
            match self.rx.fill(&mut self.transport) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("WIFI: transport read error {:?}", e);
                    break;
                }
            }
        }

        let mut line = [0u8; LINE_CAP];
        let mut pending = false;
        let mut n = self.rx.read_line(&mut line, false);
        if n == 0 {
            n = self.rx.read_line(&mut line, true);
            pending = true;
            if n == 0 {
                self.ssi_answered = false;
            }
        }

        while n != 0 {
            if n > 2 {
                self.dispatch_line(&line[..n], pending, now_ms, content);
            }
            if pending {
                break;
            }
            n = self.rx.read_line(&mut line, false);
        }

        if self.status == CmdStatus::Processing
            && self.cmd_timer.is_expired(now_ms, self.timing.cmd_timeout_ms)
        {
            warn!("WIFI: {:?} timed out", self.current);
            self.answer_bridge("Timeout");
            self.finish(CmdStatus::DoneError);
        }
    }

    fn dispatch_line(
        &mut self,
        bytes: &[u8],
        pending: bool,
        now_ms: u32,
        content: &mut impl ContentPort,
    ) {
        let Ok(text) = core::str::from_utf8(bytes) else {
            debug!("WIFI: non-text line ignored");
            return;
        };

        if let Some(rest) = text.strip_prefix(WIND_PREFIX) {
            self.on_wind(rest, pending, now_ms, content);
        } else if pending {
            // only WIND requests are answered before their terminator
        } else if let Some(rest) = text.strip_prefix(CGI_PREFIX) {
            on_cgi(rest, content);
        } else if self.flags.data_mode
            && self.flags.socket_connected
            && self.state == WifiState::Connected
        {
            let mut frame = EventText::new();
            push_truncated(&mut frame, text.trim_end_matches(['\r', '\n']));
            self.data_idle_timer.start(now_ms);
            self.push_event(WifiEvent::SocketFrame(frame));
        } else {
            self.on_response_line(text);
        }
    }

    fn on_wind(&mut self, rest: &str, pending: bool, now_ms: u32, content: &mut impl ContentPort) {
        let Some(desc) = wind::lookup(rest) else {
            return;
        };

        let accepted = match desc.kind {
            WindKind::PowerOn => rest.contains("SPWF01S"),
            WindKind::Input => {
                if pending {
                    self.answer_ssi(&rest[desc.code.len()..], content);
                } else {
                    self.ssi_answered = false;
                }
                true
            }
            _ => true,
        };
        if !accepted || pending {
            return;
        }

        if let Some((flag, value)) = desc.flag {
            self.flags.set(flag, value);
        }
        if let Some(slot) = desc.slot {
            let value = rsplit_last(rest, ':');
            match slot {
                WindSlot::LinkIp => push_truncated(&mut self.link_ip, value),
                WindSlot::ClientIp => push_truncated(&mut self.client_ip, value),
            }
        }
        debug!("WIFI: wind {:?}", desc.kind);

        match desc.kind {
            WindKind::Reset | WindKind::HardFault => self.module_reset(desc.kind),
            WindKind::DataMode => {
                self.data_requested = false;
                self.escape_sent = false;
                self.data_idle_timer.start(now_ms);
            }
            WindKind::CmdMode => {
                self.escape_sent = false;
                self.data_idle_timer.stop();
            }
            WindKind::SocketConnected => info!("WIFI: socket client {}", self.client_ip),
            WindKind::SocketDisconnected => {
                self.socket_tx.clear();
                self.client_ip.clear();
            }
            _ => {}
        }
    }

    /// The module restarted: everything derived from it is stale. The
    /// configuration-sent flag survives so the reboot requested by
    /// `AT+CFUN=0` leads straight back to `Connecting`.
    fn module_reset(&mut self, kind: WindKind) {
        warn!("WIFI: module reset ({:?})", kind);
        self.flags = WifiFlags::default();
        self.clear_queue();
        self.answer_bridge("ERROR");
        self.status = CmdStatus::Idle;
        self.current = None;
        self.cmd_timer.stop();
        self.config_step = 0;
        self.data_requested = false;
        self.escape_sent = false;
        self.socket_tx.clear();
        self.link_ip.clear();
        self.client_ip.clear();
        self.set_state(WifiState::Off);
    }

    /// `+WIND:56:<label>:<p1>:<p2>` asks for dynamic page content.
    fn answer_ssi(&mut self, after_code: &str, content: &mut impl ContentPort) {
        if self.ssi_answered {
            return;
        }
        let Some((_, params)) = after_code.split_once(':') else {
            return;
        };
        let bytes = params.as_bytes();
        let (used, p1) = scan_dec(bytes, false, i32::MAX);
        let (_, p2) = scan_dec(&bytes[used..], false, i32::MAX);
        let (Some(p1), Some(p2)) = (p1, p2) else {
            return;
        };

        let mut answer: String<SSI_CAP> = String::new();
        content.ssi(p1.unsigned_abs(), p2.unsigned_abs(), &mut answer);
        self.ssi_answered = true;
        if !(self.send_inline(answer.as_bytes()) && self.send_inline(b"\r\n")) {
            self.push_event(WifiEvent::Fatal("wifi inline send"));
        }
    }

    fn send_inline(&mut self, data: &[u8]) -> bool {
        let mut polls = 0;
        while !self.transport.is_send_done() {
            polls += 1;
            if polls >= INLINE_SPIN_LIMIT {
                error!("WIFI: transmitter stuck, inline answer lost");
                return false;
            }
            core::hint::spin_loop();
        }
        matches!(self.transport.write(data), Ok(n) if n == data.len())
    }

    fn on_response_line(&mut self, text: &str) {
        if self.status != CmdStatus::Processing {
            debug!("WIFI: unexpected line {}", text.trim_end());
            return;
        }
        let Some(kind) = self.current else {
            return;
        };

        if text.starts_with("ERROR") {
            self.answer_bridge("ERROR");
            self.finish(CmdStatus::DoneError);
        } else if text == "OK\r\n" {
            if kind == WifiKind::Ext {
                let body = core::mem::take(&mut self.capture);
                self.answer_bridge(if body.is_empty() { "OK" } else { body.as_str() });
            } else if let Some(on_result) = kind.descriptor().on_result
                && let Some(event) = on_result(&self.capture)
            {
                self.push_event(event);
            }
            self.finish(CmdStatus::DoneOk);
        } else {
            let max = kind.descriptor().capture;
            if kind == WifiKind::HttpGet {
                if text.starts_with("Date:") {
                    push_truncated(&mut self.capture, text);
                }
            } else {
                for c in text.chars() {
                    if self.capture.len() + c.len_utf8() > max || self.capture.push(c).is_err() {
                        break;
                    }
                }
            }
        }
    }

    fn finish(&mut self, outcome: CmdStatus) {
        self.status = outcome;
        self.cmd_timer.stop();
        if outcome == CmdStatus::DoneError && self.current == Some(WifiKind::ToData) {
            self.data_requested = false;
        }
    }

    /// A finished command is observable for exactly one cycle.
    fn collapse_status(&mut self) {
        match self.status {
            CmdStatus::DoneError => {
                self.command_errors = self.command_errors.wrapping_add(1);
                if self.state == WifiState::Connecting && !self.flags.wifi_up {
                    warn!("WIFI: configuration failed, retrying");
                    self.clear_queue();
                    self.config_sent = false;
                    self.config_step = 0;
                    self.config_failures = self.config_failures.saturating_add(1);
                    if self.config_failures >= CONFIG_FAILURES_BEFORE_RESET {
                        warn!("WIFI: {} failed runs, restoring factory settings", self.config_failures);
                        self.config_failures = 0;
                        self.enqueue_logged(WifiKind::FactoryReset, &[]);
                    }
                    self.set_state(WifiState::Idle);
                }
                self.status = CmdStatus::Idle;
            }
            CmdStatus::DoneOk => self.status = CmdStatus::Idle,
            CmdStatus::Idle | CmdStatus::Processing => {}
        }
    }

    fn step_state(&mut self, now_ms: u32) {
        if self.state == WifiState::Off && self.flags.is_ready() {
            self.config_step = 0;
            self.set_state(WifiState::Idle);
        }

        if self.state == WifiState::Idle {
            if !self.config_sent {
                self.queue_configuration();
            }
            if self.config_sent {
                self.set_state(WifiState::Connecting);
            }
        }

        if self.state == WifiState::Connecting && self.flags.wifi_up {
            let port = self.listen_port.clone();
            if self.enqueue(WifiKind::SocketServer, &[port.as_str()]).is_ok() {
                self.config_failures = 0;
                self.housekeeping_timer.start(now_ms);
                self.set_state(WifiState::Connected);
            }
        }

        if self.state == WifiState::Connected
            && self
                .housekeeping_timer
                .is_expired(now_ms, self.timing.housekeeping_ms)
        {
            self.housekeeping_timer.start(now_ms);
            if self.status == CmdStatus::Idle && !self.flags.data_mode && self.queue.is_empty() {
                self.queue_housekeeping();
            }
        }
    }

    /// Gateway ping, vicinity scan and time fetch, in that order.
    fn queue_housekeeping(&mut self) {
        let gateway = self.gateway.clone();
        let host = self.time_host.clone();
        let path = self.time_path.clone();
        if !gateway.is_empty() {
            self.enqueue_logged(WifiKind::Ping, &[gateway.as_str()]);
        }
        self.enqueue_logged(WifiKind::Scan, &[]);
        self.enqueue_logged(WifiKind::HttpGet, &[host.as_str(), path.as_str()]);
    }

    /// Queue an engine-internal command; a failure is only logged since a
    /// full queue already raised [`WifiEvent::QueueFull`].
    fn enqueue_logged(&mut self, kind: WifiKind, args: &[&str]) {
        if let Err(e) = self.enqueue(kind, args) {
            warn!("WIFI: {:?} not queued: {}", kind, e);
        }
    }

    /// Queue the remaining configuration steps. A full queue stops the
    /// run; it resumes from the same step next cycle.
    fn queue_configuration(&mut self) {
        while let Some(entry) = self.config_entry(self.config_step) {
            match entry {
                Ok(entry) => {
                    if self.queue.enqueue(entry).is_err() {
                        debug!("WIFI: queue full at config step {}", self.config_step);
                        return;
                    }
                }
                Err(e) => error!("WIFI: config step {} skipped: {}", self.config_step, e),
            }
            self.config_step += 1;
        }
        self.config_sent = true;
        self.config_step = 0;
        info!(
            "WIFI: configuration queued ({})",
            if self.maintenance { "access point" } else { "station" }
        );
    }

    fn config_entry(&self, step: usize) -> Option<Result<WifiEntry, WifiError>> {
        use WifiKind::{At, Cfun, Save, Scfg, SetSsid};
        let (kind, args): (WifiKind, [&str; 2]) = match (self.maintenance, step) {
            (_, 0) => (At, ["", ""]),
            (false, 1) => (Scfg, ["wifi_priv_mode", "2"]),
            (false, 2) => (Scfg, ["wifi_mode", "1"]),
            (false, 3) => (Scfg, ["wifi_wpa_psk_text", self.password.as_str()]),
            (false, 4) => (SetSsid, [self.ssid.as_str(), ""]),
            (true, 1) => (Scfg, ["wifi_priv_mode", "0"]),
            (true, 2) => (Scfg, ["wifi_mode", "3"]),
            (true, 3) => (SetSsid, [self.maint_ssid.as_str(), ""]),
            (false, 5) | (true, 4) => (Save, ["", ""]),
            (false, 6) | (true, 5) => (Cfun, ["0", ""]),
            _ => return None,
        };
        Some(format_command(kind, &args))
    }

    fn step_data_mode(&mut self, now_ms: u32) {
        if self.flags.data_mode {
            if self.escape_sent {
                return;
            }
            if !self.socket_tx.is_empty() && self.transport.is_send_done() {
                let payload = core::mem::take(&mut self.socket_tx);
                if self.transport.write(&payload).is_err() {
                    warn!("WIFI: socket payload lost");
                }
                self.write_escape();
            } else if !self.queue.is_empty()
                || self.data_idle_timer.is_expired(now_ms, self.timing.data_idle_ms)
            {
                self.write_escape();
            }
        } else if self.state == WifiState::Connected
            && self.flags.socket_connected
            && !self.data_requested
            && self.status == CmdStatus::Idle
            && self.queue.is_empty()
            && self.enqueue(WifiKind::ToData, &[]).is_ok()
        {
            self.data_requested = true;
        }
    }

    fn write_escape(&mut self) {
        self.escape_sent = true;
        self.data_idle_timer.stop();
        if self.transport.write(ESCAPE_SEQUENCE).is_err() {
            warn!("WIFI: escape sequence not accepted");
        }
    }

    fn send_next(&mut self, now_ms: u32) {
        if self.state == WifiState::Off
            || self.status != CmdStatus::Idle
            || self.flags.data_mode
            || !self.transport.is_send_done()
        {
            return;
        }
        let Some(entry) = self.queue.commit() else {
            return;
        };

        self.capture.clear();
        self.current = Some(entry.kind);
        self.current_ticket = entry.ticket;
        debug!("WIFI: tx {}", entry.text.trim_end());
        match self.transport.write(entry.text.as_bytes()) {
            Ok(n) if n == entry.text.len() => {}
            Ok(_) | Err(_) => {
                warn!("WIFI: {:?} not accepted by transport", entry.kind);
                self.answer_bridge("ERROR");
                self.status = CmdStatus::DoneError;
                return;
            }
        }

        if entry.kind.descriptor().done_on_send {
            self.status = CmdStatus::DoneOk;
        } else {
            self.status = CmdStatus::Processing;
            self.cmd_timer.start(now_ms);
        }
    }

    fn set_state(&mut self, to: WifiState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        info!("WIFI transition: {:?} -> {:?}", from, to);
        self.state = to;
        self.push_event(WifiEvent::StateChanged { from, to });
    }

    /// Report the outcome of the bridged command in flight, if any.
    fn answer_bridge(&mut self, text: &str) {
        if let Some(ticket) = self.current_ticket.take() {
            self.push_bridge(ticket, text);
        }
    }

    fn push_bridge(&mut self, ticket: Ticket, text: &str) {
        let mut owned = EventText::new();
        push_truncated(&mut owned, text);
        self.push_event(WifiEvent::BridgeResponse { ticket, text: owned });
    }

    fn push_event(&mut self, event: WifiEvent) {
        if self.events.is_full() {
            self.events.pop_front();
        }
        let _ = self.events.push_back(event);
    }

    // ── Consumer side ─────────────────────────────────────────

    /// Hand every pending event to `f`, oldest first.
    pub fn drain_events(&mut self, mut f: impl FnMut(WifiEvent)) {
        while let Some(event) = self.events.pop_front() {
            f(event);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn status(&self) -> CmdStatus {
        self.status
    }

    pub fn flags(&self) -> &WifiFlags {
        &self.flags
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    pub fn is_maintenance(&self) -> bool {
        self.maintenance
    }

    pub fn is_config_sent(&self) -> bool {
        self.config_sent
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// `ERROR` answers and timeouts since start.
    pub fn command_errors(&self) -> u32 {
        self.command_errors
    }

    pub fn link_ip(&self) -> &str {
        &self.link_ip
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Queued commands, oldest first.
    pub fn queued(&self) -> impl Iterator<Item = &WifiEntry> + '_ {
        self.queue.iter()
    }

    pub fn socket_pending(&self) -> usize {
        self.socket_tx.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// `<p1>:<p2>:<value>\r\n`
fn on_cgi(rest: &str, content: &mut impl ContentPort) {
    let rest = rest.trim_end_matches(['\r', '\n']);
    let mut parts = rest.splitn(3, ':');
    let p1 = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    let p2 = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    let value = parts.next().unwrap_or("");
    match (p1, p2) {
        (Some(p1), Some(p2)) => {
            debug!("WIFI: cgi {}:{} = {}", p1, p2, value);
            content.cgi(p1, p2, value);
        }
        _ => debug!("WIFI: malformed cgi line ignored"),
    }
}
