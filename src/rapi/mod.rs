//! Charging-hardware (OpenEVSE RAPI) protocol engine.
//!
//! ```text
//!  enqueue ──▶ CommandQueue ──peek──▶ frame ──▶ Transport
//!                   ▲                              │
//!                commit                         UART rx
//!                   │                              ▼
//!  ChargeStatus ◀── decode ◀── verify ◀── take ── ResultCell
//! ```
//!
//! At most one command is in flight. The queue head is only released
//! after a verified answer; a checksum error, a non-`$OK` answer or a
//! timeout re-sends the same head. Once the retry budget is spent the
//! engine transmits a reset frame, drops everything queued and reports a
//! link reset. Charging enable is not replayed after a reset: the owner
//! must request it again.
//!
//! For a warm-up period after start (and after every reset) only an
//! `Enable` head is sent. After warm-up the five status queries are
//! queued every poll interval, and the firmware version is read once.
//!
//! A bridged raw command carries the caller's [`Ticket`]. Abandoning it
//! while its exchange is on the wire keeps the exchange running but drops
//! its answer; a new raw command waits behind it in a second slot.

pub mod command;
pub mod frame;
pub mod status;

use heapless::{Deque, String};
use log::{debug, error, info, warn};

use crate::ascii::push_truncated;
use crate::bridge::Ticket;
use crate::config::SystemConfig;
use crate::error::{Error, QueueFull, RapiError};
use crate::queue::CommandQueue;
use crate::timer::MsTimer;
use crate::transport::{Completed, ResultCell, Transport};

use command::{POLL_SET, RESET_TEXT, RapiEntry, RapiKind};
use status::ChargeStatus;

/// Ring slots; one stays empty, so seven commands fit.
pub const QUEUE_SLOTS: usize = 8;
/// In-flight response buffer size.
pub const RESULT_CAP: usize = 48;
/// Ring for bytes received while no command is outstanding.
pub const UNSOLICITED_CAP: usize = 64;
/// Longest bridged command or response text.
pub const BRIDGE_CAP: usize = 48;

const EVENT_CAP: usize = 8;

pub type RapiCell = ResultCell<RESULT_CAP, UNSOLICITED_CAP>;

/// Receive cell fed by the RAPI UART interrupt.
pub static RAPI_RX: RapiCell = RapiCell::new();

/// Notifications produced by [`RapiEngine::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RapiEvent {
    /// A command completed and its decoder ran.
    Response(RapiKind),
    /// Answer to a bridged raw command.
    BridgeResponse {
        ticket: Ticket,
        text: String<BRIDGE_CAP>,
        complete: bool,
    },
    /// Retry budget exhausted; the link was reset.
    LinkReset { count: u32 },
}

/// Text of a bridged raw command. `ticket` is `None` once abandoned.
#[derive(Debug, Clone)]
struct RawRequest {
    text: String<BRIDGE_CAP>,
    ticket: Option<Ticket>,
}

#[derive(Debug, Clone, Copy)]
struct RapiTiming {
    timeout_ms: u32,
    max_retries: u8,
    warmup_ms: u32,
    poll_ms: u32,
}

pub struct RapiEngine<'a, T: Transport> {
    transport: T,
    rx: &'a RapiCell,
    queue: CommandQueue<RapiEntry, QUEUE_SLOTS>,
    status: ChargeStatus,
    raw: Option<RawRequest>,
    raw_next: Option<RawRequest>,
    in_flight: bool,
    retries: u8,
    response_timer: MsTimer,
    warmup_timer: MsTimer,
    poll_timer: MsTimer,
    warmed_up: bool,
    version_due: bool,
    link_resets: u32,
    link_fault: bool,
    unsolicited_bytes: u32,
    events: Deque<RapiEvent, EVENT_CAP>,
    timing: RapiTiming,
}

impl<'a, T: Transport> RapiEngine<'a, T> {
    pub fn new(transport: T, rx: &'a RapiCell, config: &SystemConfig) -> Self {
        Self {
            transport,
            rx,
            queue: CommandQueue::new(),
            status: ChargeStatus::default(),
            raw: None,
            raw_next: None,
            in_flight: false,
            retries: 0,
            response_timer: MsTimer::new(),
            warmup_timer: MsTimer::new(),
            poll_timer: MsTimer::new(),
            warmed_up: false,
            version_due: false,
            link_resets: 0,
            link_fault: false,
            unsolicited_bytes: 0,
            events: Deque::new(),
            timing: RapiTiming {
                timeout_ms: config.rapi_timeout_ms,
                max_retries: config.rapi_max_retries,
                warmup_ms: config.rapi_warmup_ms,
                poll_ms: config.rapi_poll_ms,
            },
        }
    }

    /// Queue the start-up `Enable` and begin the warm-up period.
    pub fn init(&mut self, now_ms: u32) {
        self.queue.clear();
        self.raw = None;
        self.raw_next = None;
        self.rx.disarm();
        self.in_flight = false;
        self.retries = 0;
        self.warmed_up = false;
        self.warmup_timer.start(now_ms);
        self.poll_timer.stop();
        if self.queue.enqueue(RapiEntry::new(RapiKind::Enable)).is_err() {
            error!("RAPI: queue full at init");
        }
        info!("RAPI: started, warm-up {} ms", self.timing.warmup_ms);
    }

    // ── Producer side ─────────────────────────────────────────

    /// Queue a command with its numeric parameters.
    pub fn enqueue(&mut self, kind: RapiKind, params: &[i32]) -> Result<(), QueueFull> {
        let result = self.queue.enqueue(RapiEntry::with_params(kind, params));
        if result.is_err() {
            warn!("RAPI: queue full, {:?} dropped", kind);
        }
        result
    }

    /// Request charging enabled or disabled.
    pub fn set_enable(&mut self, enable: bool) -> Result<(), QueueFull> {
        let kind = if enable {
            RapiKind::Enable
        } else {
            RapiKind::Disable
        };
        self.enqueue(kind, &[])
    }

    /// Queue caller text verbatim (checksum appended on send). Its full
    /// answer is delivered as [`RapiEvent::BridgeResponse`] with `ticket`.
    pub fn enqueue_raw(&mut self, text: &str, ticket: Ticket) -> Result<(), Error> {
        let live = self.raw.as_ref().is_some_and(|r| r.ticket.is_some());
        if live || self.raw_next.is_some() {
            return Err(RapiError::BridgeBusy.into());
        }
        if text.len() > BRIDGE_CAP {
            return Err(RapiError::FrameTooLong.into());
        }
        self.enqueue(RapiKind::Raw, &[])?;
        let mut owned = String::new();
        push_truncated(&mut owned, text);
        let request = RawRequest {
            text: owned,
            ticket: Some(ticket),
        };
        if self.raw.is_none() {
            self.raw = Some(request);
        } else {
            self.raw_next = Some(request);
        }
        Ok(())
    }

    /// Forget the bridged raw command. One already on the wire runs to its
    /// end without reporting; a queued one is not sent.
    pub fn abandon_raw(&mut self) {
        self.raw_next = None;
        let on_wire = self.in_flight && self.queue.peek().is_some_and(|e| e.kind == RapiKind::Raw);
        if on_wire {
            if let Some(raw) = self.raw.as_mut() {
                raw.ticket = None;
            }
        } else {
            self.raw = None;
        }
    }

    // ── Poll routine ──────────────────────────────────────────

    /// Advance the engine. Call every cycle; never blocks.
    pub fn poll(&mut self, now_ms: u32) {
        self.pump_rx();
        self.drain_unsolicited();

        if self.in_flight {
            match self.rx.take() {
                Some(done) => self.on_response(&done, now_ms),
                None => {
                    if self.response_timer.is_expired(now_ms, self.timing.timeout_ms) {
                        self.on_failure(RapiError::Timeout, now_ms);
                    }
                }
            }
        }

        if !self.warmed_up && self.warmup_timer.is_expired(now_ms, self.timing.warmup_ms) {
            self.warmed_up = true;
            self.version_due = true;
            self.warmup_timer.stop();
            info!("RAPI: warm-up complete, status polling enabled");
        }

        if self.warmed_up {
            self.schedule_polls(now_ms);
        }

        if !self.in_flight {
            self.send_next(now_ms);
        }
    }

    /// Bytes pulled from the transport take the same path as the receive
    /// interrupt.
    fn pump_rx(&mut self) {
        let mut chunk = [0u8; 32];
        loop {
            match self.transport.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    for &b in &chunk[..n] {
                        self.rx.push_byte(b);
                    }
                }
                Err(e) => {
                    warn!("RAPI: transport read error {:?}", e);
                    break;
                }
            }
        }
    }

    /// Bytes that arrived with nothing in flight, e.g. state-change
    /// notifications, are logged and dropped.
    fn drain_unsolicited(&mut self) {
        let mut buf = [0u8; UNSOLICITED_CAP];
        let n = self.rx.drain_unsolicited(&mut buf);
        if n == 0 {
            return;
        }
        self.unsolicited_bytes = self.unsolicited_bytes.wrapping_add(n as u32);
        match core::str::from_utf8(&buf[..n]) {
            Ok(text) => debug!("RAPI: unsolicited {:?}", text),
            Err(_) => debug!("RAPI: {} unsolicited bytes", n),
        }
    }

    fn schedule_polls(&mut self, now_ms: u32) {
        let due = !self.poll_timer.is_running()
            || self.poll_timer.is_expired(now_ms, self.timing.poll_ms);
        if due && self.queue.free() >= POLL_SET.len() {
            for kind in POLL_SET {
                let _ = self.queue.enqueue(RapiEntry::new(kind));
            }
            self.poll_timer.start(now_ms);
        }
        if self.version_due && self.queue.free() >= 1 {
            let _ = self.queue.enqueue(RapiEntry::new(RapiKind::GetVersion));
            self.version_due = false;
        }
    }

    fn send_next(&mut self, now_ms: u32) {
        let Some(entry) = self.queue.peek().copied() else {
            return;
        };
        if !self.warmed_up && entry.kind != RapiKind::Enable {
            return;
        }

        let desc = entry.kind.descriptor();
        let framed = if entry.kind == RapiKind::Raw {
            match &self.raw {
                Some(raw) => frame::encode(&raw.text, None),
                None => {
                    warn!("RAPI: raw entry without text dropped");
                    self.queue.commit();
                    return;
                }
            }
        } else {
            let known = if entry.param_len == 0 { desc.checksum } else { None };
            frame::format_text(desc.text, entry.params()).and_then(|t| frame::encode(&t, known))
        };

        let framed = match framed {
            Ok(f) => f,
            Err(e) => {
                error!("RAPI: cannot frame {:?}: {}", entry.kind, e);
                self.queue.commit();
                if entry.kind == RapiKind::Raw {
                    self.finish_bridge("$NK");
                }
                return;
            }
        };

        self.rx.arm();
        self.in_flight = true;
        self.response_timer.start(now_ms);
        debug!("RAPI: tx {:?} (try {})", entry.kind, self.retries + 1);

        match self.transport.write(&framed) {
            Ok(n) if n == framed.len() => {}
            Ok(_) | Err(_) => self.on_failure(RapiError::Transport, now_ms),
        }
    }

    fn on_response(&mut self, done: &Completed<RESULT_CAP>, now_ms: u32) {
        let Some(entry) = self.queue.peek().copied() else {
            self.in_flight = false;
            return;
        };
        if done.overflow {
            self.on_failure(RapiError::Overflow, now_ms);
            return;
        }
        let body = match frame::verify(&done.data) {
            Ok(body) => body,
            Err(e) => {
                self.on_failure(e, now_ms);
                return;
            }
        };

        if entry.kind == RapiKind::Raw {
            let text = core::str::from_utf8(&done.data).unwrap_or("$NK");
            self.finish_bridge(text);
        } else {
            let Some(payload) = body.strip_prefix(b"$OK") else {
                self.on_failure(RapiError::NotOk, now_ms);
                return;
            };
            if let Some(decode) = entry.kind.descriptor().decode {
                decode(payload, &mut self.status);
            }
            self.push_event(RapiEvent::Response(entry.kind));
        }

        self.queue.commit();
        self.in_flight = false;
        self.retries = 0;
        self.link_fault = false;
        self.response_timer.stop();
    }

    fn on_failure(&mut self, reason: RapiError, now_ms: u32) {
        self.in_flight = false;
        self.response_timer.stop();
        self.rx.disarm();

        if self.retries < self.timing.max_retries {
            self.retries += 1;
            warn!(
                "RAPI: {} on {:?}, retry {}/{}",
                reason,
                self.queue.peek().map(|e| e.kind),
                self.retries,
                self.timing.max_retries
            );
        } else {
            self.hard_reset(now_ms);
        }
    }

    fn hard_reset(&mut self, now_ms: u32) {
        self.link_resets = self.link_resets.wrapping_add(1);
        error!(
            "RAPI: retries exhausted, resetting link (reset #{})",
            self.link_resets
        );

        match frame::encode(RESET_TEXT, None) {
            Ok(reset) => {
                if self.transport.write(&reset).is_err() {
                    warn!("RAPI: reset frame not accepted");
                }
            }
            Err(e) => error!("RAPI: cannot frame reset: {}", e),
        }

        while self.raw.is_some() {
            self.finish_bridge("Timeout");
        }
        self.queue.clear();
        self.rx.disarm();
        self.in_flight = false;
        self.retries = 0;
        self.link_fault = true;
        self.warmed_up = false;
        self.version_due = false;
        self.warmup_timer.start(now_ms);
        self.poll_timer.stop();
        self.push_event(RapiEvent::LinkReset {
            count: self.link_resets,
        });
    }

    /// End the current raw command and promote the one waiting behind it.
    fn finish_bridge(&mut self, text: &str) {
        let done = self.raw.take();
        self.raw = self.raw_next.take();
        let Some(ticket) = done.and_then(|r| r.ticket) else {
            debug!("RAPI: answer to abandoned raw command dropped");
            return;
        };
        let mut owned = String::new();
        push_truncated(&mut owned, text);
        self.push_event(RapiEvent::BridgeResponse {
            ticket,
            text: owned,
            complete: true,
        });
    }

    fn push_event(&mut self, event: RapiEvent) {
        if self.events.is_full() {
            self.events.pop_front();
        }
        let _ = self.events.push_back(event);
    }

    // ── Consumer side ─────────────────────────────────────────

    /// Hand every pending event to `f`, oldest first.
    pub fn drain_events(&mut self, mut f: impl FnMut(RapiEvent)) {
        while let Some(event) = self.events.pop_front() {
            f(event);
        }
    }

    /// Bytes received with no command in flight since start.
    pub fn unsolicited_bytes(&self) -> u32 {
        self.unsolicited_bytes
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> &ChargeStatus {
        &self.status
    }

    /// True from a link reset until the next verified response.
    pub fn has_link_fault(&self) -> bool {
        self.link_fault
    }

    pub fn link_resets(&self) -> u32 {
        self.link_resets
    }

    pub fn is_warmed_up(&self) -> bool {
        self.warmed_up
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// A bridged raw command still owes its caller an answer.
    pub fn is_bridge_pending(&self) -> bool {
        self.raw.as_ref().is_some_and(|r| r.ticket.is_some()) || self.raw_next.is_some()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_free(&self) -> usize {
        self.queue.free()
    }

    /// Kinds waiting in the queue, oldest first.
    pub fn queued_kinds(&self) -> impl Iterator<Item = RapiKind> + '_ {
        self.queue.iter().map(|e| e.kind)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
