//! Application service: the hexagonal core.
//!
//! [`AppService`] owns both protocol engines, the admission FSM and its
//! context, the panel filters, the socket bridge and the diagnostics. All
//! other I/O flows through the port traits bundled in [`Ports`], so the
//! whole controller runs on the host against mock adapters.
//!
//! ```text
//!  SensorPort ────▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  ClockPort ─────▶ │          AppService           │
//!  CalendarPort ──▶ │  WifiEngine · RapiEngine      │ ──▶ IndicatorPort
//!  StoragePort ◀──▶ │  AdmissionFsm · SocketBridge  │
//!                   └──────────────────────────────┘
//! ```
//!
//! One call to [`AppService::cycle`] per scheduling period runs the
//! communication half ([`poll_comms`](AppService::poll_comms)) and then the
//! control half ([`control_cycle`](AppService::control_cycle)).

use heapless::{String, Vec};
use log::{error, info, warn};

use crate::adapters::html_info::{CgiAction, HtmlInfo, StatusSnapshot};
use crate::bridge::{self, CODE_RAPI, CODE_WIFI, Decision, Request, SocketBridge, Ticket};
use crate::config::{self, SystemConfig};
use crate::diagnostics::{self, Counter, ErrorCounters, FatalLatch};
use crate::drivers::button::{ButtonEvent, ButtonFilter};
use crate::drivers::led::{BlinkChannel, LedColor, LedPattern};
use crate::drivers::plug::PlugDetector;
use crate::error::{Error, QueueFull};
use crate::fsm::context::{ChargeContext, ChargeInputs, ForceLevel};
use crate::fsm::states::build_state_table;
use crate::fsm::{AdmissionFsm, AdmissionState, indicators};
use crate::history::StateHistory;
use crate::persist::{self, ADDR_PASSWORD, ADDR_SSID, PASSWORD_WORDS, SSID_WORDS};
use crate::rapi::{RapiCell, RapiEngine, RapiEvent};
use crate::timer::MsTimer;
use crate::transport::Transport;
use crate::wifi::{WifiEngine, WifiEvent};

use super::commands::AppCommand;
use super::events::{AppEvent, Engine, TelemetryData};
use super::ports::{
    CalendarPort, ClockPort, ConfigPort, EventSink, Indicator, IndicatorPort, SensorPort,
    StorageError, StoragePort,
};

/// Period of the `TELEM` event.
pub const TELEMETRY_INTERVAL_MS: u32 = 60_000;

/// Longest wait for a bridge reply to leave before a requested Wi-Fi
/// restart discards the socket buffer.
pub const RESTART_FLUSH_MS: u32 = 2_000;

/// Highest accepted minimum-stop current (A).
pub const MAX_MIN_STOP_A: u8 = 80;

const EVENT_BATCH: usize = 8;

/// Every collaborator the service talks to, borrowed for one call.
pub struct Ports<'p, H, S, C, K, E> {
    pub hw: &'p mut H,
    pub store: &'p mut S,
    pub clock: &'p mut C,
    pub calendar: &'p mut K,
    pub sink: &'p mut E,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<'a, W: Transport, R: Transport> {
    config: SystemConfig,
    wifi: WifiEngine<W>,
    rapi: RapiEngine<'a, R>,
    fsm: AdmissionFsm,
    ctx: ChargeContext,
    button: ButtonFilter,
    plug: PlugDetector,
    wifi_led: BlinkChannel,
    charge_led: BlinkChannel,
    bridge: SocketBridge,
    history: StateHistory,
    counters: ErrorCounters,
    fatal: FatalLatch,
    snapshot: StatusSnapshot,
    telemetry_timer: MsTimer,
    restart_timer: MsTimer,
    persisted_force: ForceLevel,
    maintenance: bool,
    enable_blocked: bool,
}

impl<'a, W: Transport, R: Transport> AppService<'a, W, R> {
    /// Build the service. Nothing is sent until [`start`](Self::start).
    pub fn new(config: SystemConfig, wifi_transport: W, rapi_transport: R, rapi_rx: &'a RapiCell) -> Self {
        let wifi = WifiEngine::new(wifi_transport, &config);
        let rapi = RapiEngine::new(rapi_transport, rapi_rx, &config);
        let ctx = ChargeContext::new(&config);
        let fsm = AdmissionFsm::new(build_state_table(), AdmissionState::Off);

        Self {
            wifi,
            rapi,
            fsm,
            ctx,
            button: ButtonFilter::new(config.button_filter_ms, config.long_press_ms),
            plug: PlugDetector::new(config.plug_threshold, config.plug_grace_ms),
            wifi_led: BlinkChannel::new(config.blink_half_period_ms),
            charge_led: BlinkChannel::new(config.blink_half_period_ms),
            bridge: SocketBridge::new(),
            history: StateHistory::new(),
            counters: ErrorCounters::new(),
            fatal: FatalLatch::new(),
            snapshot: StatusSnapshot::default(),
            telemetry_timer: MsTimer::new(),
            restart_timer: MsTimer::new(),
            persisted_force: ForceLevel::None,
            maintenance: false,
            enable_blocked: false,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Restore persisted settings, start both engines and enter the
    /// initial admission state.
    pub fn start<H, S, C, K, E>(&mut self, now_ms: u32, ports: &mut Ports<'_, H, S, C, K, E>)
    where
        S: StoragePort,
        K: CalendarPort,
        E: EventSink,
    {
        let store = &mut *ports.store;

        let force = persist::load_force(store);
        self.ctx.force = force;
        self.persisted_force = force;
        self.ctx.min_stop_current_a = persist::load_min_stop(store, self.config.min_stop_current_a);

        let windows = persist::restore_calendar(store, ports.calendar);

        let ssid: Option<String<32>> = persist::load_text(store, ADDR_SSID, SSID_WORDS);
        let password: Option<String<64>> = persist::load_text(store, ADDR_PASSWORD, PASSWORD_WORDS);
        if let Some(ssid) = &ssid {
            self.wifi.set_ssid(ssid);
        }
        if let Some(password) = &password {
            self.wifi.set_password(password);
        }

        if let Some(reason) = diagnostics::last_fatal(store) {
            warn!("APP: previous run halted: {}", reason);
            if let Err(e) = diagnostics::clear_fatal(store) {
                self.storage_failed(e);
            }
        }

        info!(
            "APP: restored force={} min_stop={}A windows={} ssid={}",
            force.name(),
            self.ctx.min_stop_current_a,
            windows,
            if ssid.is_some() { "set" } else { "unset" }
        );

        self.rapi.init(now_ms);
        self.fsm.start(&mut self.ctx);
        self.history.push(self.fsm.current_state());
        self.telemetry_timer.start(now_ms);

        ports.sink.emit(&AppEvent::Started {
            state: self.fsm.current_state(),
            force,
        });
    }

    /// One scheduling period: communications first, then control.
    pub fn cycle<H, S, C, K, E>(&mut self, now_ms: u32, ports: &mut Ports<'_, H, S, C, K, E>)
    where
        H: SensorPort + IndicatorPort,
        S: StoragePort + ConfigPort,
        C: ClockPort,
        K: CalendarPort,
        E: EventSink,
    {
        self.poll_comms(now_ms, ports);
        self.control_cycle(now_ms, ports);
    }

    // ── Communication half ────────────────────────────────────

    /// Advance the clock, poll both engines and act on their events.
    pub fn poll_comms<H, S, C, K, E>(&mut self, now_ms: u32, ports: &mut Ports<'_, H, S, C, K, E>)
    where
        H: SensorPort + IndicatorPort,
        S: StoragePort + ConfigPort,
        C: ClockPort,
        K: CalendarPort,
        E: EventSink,
    {
        ports.clock.tick(now_ms);
        self.refresh_snapshot();

        let actions = {
            let mut page =
                HtmlInfo::new(&self.snapshot, &mut *ports.clock, &mut *ports.calendar, now_ms);
            self.wifi.poll(now_ms, &mut page);
            page.into_actions()
        };

        let mut wifi_events: Vec<WifiEvent, EVENT_BATCH> = Vec::new();
        self.wifi.drain_events(|ev| {
            if wifi_events.push(ev).is_err() {
                warn!("APP: wifi event batch full");
            }
        });
        for ev in wifi_events {
            self.on_wifi_event(ev, now_ms, ports);
        }

        for action in actions {
            self.on_cgi_action(action, now_ms, ports);
        }

        if self.restart_timer.is_running()
            && (self.wifi.socket_pending() == 0
                || self.restart_timer.is_expired(now_ms, RESTART_FLUSH_MS))
        {
            self.restart_timer.stop();
            self.wifi.restart();
        }

        self.rapi.poll(now_ms);
        let mut rapi_events: Vec<RapiEvent, EVENT_BATCH> = Vec::new();
        self.rapi.drain_events(|ev| {
            if rapi_events.push(ev).is_err() {
                warn!("APP: rapi event batch full");
            }
        });
        for ev in rapi_events {
            self.on_rapi_event(ev, ports.sink);
        }

        self.counters.wifi_command_errors = self.wifi.command_errors();
    }

    fn on_wifi_event<H, S, C, K, E>(
        &mut self,
        event: WifiEvent,
        now_ms: u32,
        ports: &mut Ports<'_, H, S, C, K, E>,
    ) where
        S: StoragePort,
        C: ClockPort,
        E: EventSink,
    {
        match event {
            WifiEvent::StateChanged { from, to } => {
                ports.sink.emit(&AppEvent::WifiStateChanged { from, to });
            }
            WifiEvent::SocketFrame(line) => match self.bridge.accept(&line) {
                Decision::Ignore => {}
                Decision::Reply(reply) => self.send_reply(&reply),
                Decision::Execute(request) => self.execute_request(request, now_ms, ports),
                Decision::Defer(request, ticket) => self.defer_request(request, ticket, ports),
            },
            WifiEvent::BridgeResponse { ticket, text } => {
                if let Some(reply) = self.bridge.complete(CODE_WIFI, ticket, &text) {
                    self.send_reply(&reply);
                }
            }
            WifiEvent::TimeSync(dt) => match ports.clock.set(dt, now_ms) {
                Ok(()) => ports.sink.emit(&AppEvent::DateTimeSynced(dt)),
                Err(e) => warn!("CLOCK: sync rejected: {}", e),
            },
            WifiEvent::QueueFull => {
                self.counters.bump(Counter::WifiQueueFull);
                ports.sink.emit(&AppEvent::QueueOverflow(Engine::Wifi));
            }
            WifiEvent::Fatal(reason) => self.trip_fatal(reason, now_ms, ports.store, ports.sink),
        }
    }

    fn on_rapi_event(&mut self, event: RapiEvent, sink: &mut impl EventSink) {
        match event {
            RapiEvent::Response(_) => {}
            RapiEvent::BridgeResponse {
                ticket,
                text,
                complete,
            } => {
                if complete && let Some(reply) = self.bridge.complete(CODE_RAPI, ticket, &text) {
                    self.send_reply(&reply);
                }
            }
            RapiEvent::LinkReset { count } => {
                self.counters.bump(Counter::RapiLinkReset);
                // the reset flushed the queue, including any enable in it
                self.ctx.resync_enable();
                sink.emit(&AppEvent::HardwareLinkReset { count });
            }
        }
    }

    /// Form submissions. Clock and calendar were already written by the
    /// page; only persistence and the remaining settings happen here.
    fn on_cgi_action<H, S, C, K, E>(
        &mut self,
        action: CgiAction,
        now_ms: u32,
        ports: &mut Ports<'_, H, S, C, K, E>,
    ) where
        S: StoragePort + ConfigPort,
        C: ClockPort,
        K: CalendarPort,
        E: EventSink,
    {
        match action {
            CgiAction::DateTimeSet(dt) => ports.sink.emit(&AppEvent::DateTimeSynced(dt)),
            CgiAction::WindowChanged { weekday, window } => {
                if let Err(e) = persist::save_window(ports.store, weekday, window) {
                    self.storage_failed(e);
                }
            }
            CgiAction::SetMinStopCurrent(amps) => {
                if let Err(e) = self.handle_command(AppCommand::SetMinStopCurrent(amps), now_ms, ports) {
                    warn!("HTML: minimum current rejected: {}", e);
                }
            }
            CgiAction::CycleForce => {
                if let Err(e) = self.handle_command(AppCommand::CycleForce, now_ms, ports) {
                    warn!("HTML: force change rejected: {}", e);
                }
            }
        }
    }

    // ── Socket bridge ─────────────────────────────────────────

    fn execute_request<H, S, C, K, E>(
        &mut self,
        request: Request<'_>,
        now_ms: u32,
        ports: &mut Ports<'_, H, S, C, K, E>,
    ) where
        S: StoragePort,
        E: EventSink,
    {
        let code = request.code();
        match request {
            Request::Wifi(_) | Request::Rapi(_) => {
                warn!("BRIDGE: {:02X} needs a ticket, refused", code);
                self.send_reply(&bridge::respond(code, "ERR"));
            }
            Request::SetSsid(ssid) => {
                let ok = self.store_ssid(ssid, ports.store);
                self.send_reply(&bridge::respond(code, if ok { "OK" } else { "ERR" }));
            }
            Request::SetPassword(password) => {
                let ok = self.store_password(password, ports.store);
                self.send_reply(&bridge::respond(code, if ok { "OK" } else { "ERR" }));
            }
            Request::Restart => {
                self.send_reply(&bridge::respond(code, "OK"));
                self.rapi.abandon_raw();
                self.restart_timer.start(now_ms);
            }
            Request::Name => {
                let reply = bridge::respond(code, &self.config.device_name);
                self.send_reply(&reply);
            }
        }
    }

    /// Hand a delayed request to its engine. A refusal is answered at once.
    fn defer_request<H, S, C, K, E>(
        &mut self,
        request: Request<'_>,
        ticket: Ticket,
        ports: &mut Ports<'_, H, S, C, K, E>,
    ) where
        E: EventSink,
    {
        let code = request.code();
        let queued = match request {
            // a full queue is reported through WifiEvent::QueueFull
            Request::Wifi(text) => self.wifi.enqueue_ext(text, ticket),
            Request::Rapi(text) => {
                let queued = self.rapi.enqueue_raw(text, ticket);
                if let Err(Error::Queue(_)) = queued {
                    self.counters.bump(Counter::RapiQueueFull);
                    ports.sink.emit(&AppEvent::QueueOverflow(Engine::Rapi));
                }
                queued
            }
            _ => Err(Error::Config("not a delayed request")),
        };
        if let Err(e) = queued {
            warn!("BRIDGE: request {:02X} refused: {}", code, e);
            self.bridge.cancel();
            self.send_reply(&bridge::respond(code, "ERR"));
        }
    }

    fn send_reply(&mut self, reply: &bridge::Response) {
        if let Err(e) = self.wifi.send_socket(reply.as_bytes()) {
            warn!("BRIDGE: reply dropped: {}", e);
        }
    }

    fn store_ssid(&mut self, ssid: &str, store: &mut impl StoragePort) -> bool {
        if ssid.is_empty() || ssid.len() > usize::from(SSID_WORDS) * 2 {
            warn!("BRIDGE: SSID length {} out of range", ssid.len());
            return false;
        }
        if let Err(e) = persist::save_text(store, ADDR_SSID, SSID_WORDS, ssid) {
            self.storage_failed(e);
            return false;
        }
        self.wifi.set_ssid(ssid);
        info!("WIFI: SSID set to {}", ssid);
        true
    }

    fn store_password(&mut self, password: &str, store: &mut impl StoragePort) -> bool {
        if password.len() > usize::from(PASSWORD_WORDS) * 2 {
            warn!("BRIDGE: password too long");
            return false;
        }
        if let Err(e) = persist::save_text(store, ADDR_PASSWORD, PASSWORD_WORDS, password) {
            self.storage_failed(e);
            return false;
        }
        self.wifi.set_password(password);
        info!("WIFI: password updated");
        true
    }

    // ── Control half ──────────────────────────────────────────

    /// Sample the panel, run the admission FSM, forward its enable
    /// request and refresh the indicators.
    pub fn control_cycle<H, S, C, K, E>(&mut self, now_ms: u32, ports: &mut Ports<'_, H, S, C, K, E>)
    where
        H: SensorPort + IndicatorPort,
        S: StoragePort + ConfigPort,
        C: ClockPort,
        K: CalendarPort,
        E: EventSink,
    {
        if self.fatal.is_tripped() {
            let halted = LedPattern::blinking(LedColor::Red);
            let wifi = self.wifi_led.update(halted, now_ms);
            let charge = self.charge_led.update(halted, now_ms);
            ports.hw.set_indicator(Indicator::Wifi, wifi);
            ports.hw.set_indicator(Indicator::Charge, charge);
            return;
        }

        // 1. Panel
        let pressed = ports.hw.button_pressed();
        let command = match self.button.update(pressed, now_ms) {
            Some(ButtonEvent::ShortPress) => Some(AppCommand::CycleForce),
            Some(ButtonEvent::LongPress) => Some(AppCommand::ToggleMaintenance),
            None => None,
        };
        if let Some(command) = command
            && let Err(e) = self.handle_command(command, now_ms, ports)
        {
            warn!("PANEL: button command rejected: {}", e);
        }
        let sample = ports.hw.plug_sample();
        self.plug.update(sample, now_ms);

        // 2. Admission inputs
        let lost = ports.clock.is_date_time_lost();
        let calendar_open = !lost && ports.calendar.is_charge_window_open(&ports.clock.now());
        let status = self.rapi.status();
        self.ctx.inputs = ChargeInputs {
            now_ms,
            calendar_open,
            hw_charging: status.is_charging(),
            current_ma: status.current_ma,
            plug_grace: self.plug.in_grace(now_ms),
        };

        // 3. FSM
        if let Some((from, to)) = self.fsm.tick(&mut self.ctx) {
            self.history.push(to);
            ports.sink.emit(&AppEvent::AdmissionChanged { from, to });
        }

        // 4. Leaving Charging may have cleared the forced level
        self.sync_force(ports.store, ports.sink);

        // 5. Enable edge to the hardware
        self.flush_enable_request(ports.sink);

        // 6. Indicators
        let wifi = indicators::wifi_pattern(
            self.wifi.is_maintenance(),
            self.rapi.has_link_fault(),
            self.wifi.is_connected(),
        );
        let charge =
            indicators::charge_pattern(self.fsm.current_state(), self.ctx.force, false, lost);
        let wifi = self.wifi_led.update(wifi, now_ms);
        let charge = self.charge_led.update(charge, now_ms);
        ports.hw.set_indicator(Indicator::Wifi, wifi);
        ports.hw.set_indicator(Indicator::Charge, charge);

        // 7. Reporting
        let maintenance = self.wifi.is_maintenance();
        if maintenance != self.maintenance {
            self.maintenance = maintenance;
            ports.sink.emit(&AppEvent::MaintenanceChanged(maintenance));
        }
        if self.telemetry_timer.is_expired(now_ms, TELEMETRY_INTERVAL_MS) {
            self.telemetry_timer.start(now_ms);
            ports.sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    fn sync_force(&mut self, store: &mut impl StoragePort, sink: &mut impl EventSink) {
        let force = self.ctx.force;
        if force == self.persisted_force {
            return;
        }
        self.persisted_force = force;
        if let Err(e) = persist::save_force(store, force) {
            self.storage_failed(e);
        }
        sink.emit(&AppEvent::ForceLevelChanged(force));
    }

    /// A full queue keeps the request for the next cycle; the overflow is
    /// reported once per request.
    fn flush_enable_request(&mut self, sink: &mut impl EventSink) {
        let Some(enable) = self.ctx.enable_request else {
            return;
        };
        match self.rapi.set_enable(enable) {
            Ok(()) => {
                self.ctx.enable_request = None;
                self.enable_blocked = false;
                sink.emit(&AppEvent::EnableChanged(enable));
            }
            Err(QueueFull) => {
                if !self.enable_blocked {
                    self.enable_blocked = true;
                    self.counters.bump(Counter::RapiQueueFull);
                    sink.emit(&AppEvent::QueueOverflow(Engine::Rapi));
                }
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply an external command (button, status page, host tooling).
    pub fn handle_command<H, S, C, K, E>(
        &mut self,
        cmd: AppCommand,
        now_ms: u32,
        ports: &mut Ports<'_, H, S, C, K, E>,
    ) -> Result<(), Error>
    where
        S: StoragePort + ConfigPort,
        C: ClockPort,
        K: CalendarPort,
        E: EventSink,
    {
        if self.fatal.is_tripped() {
            return Err(Error::Fatal("controller halted"));
        }

        match cmd {
            AppCommand::CycleForce => {
                self.ctx.force = self.ctx.force.next();
                self.sync_force(ports.store, ports.sink);
            }
            AppCommand::SetForce(force) => {
                self.ctx.force = force;
                self.sync_force(ports.store, ports.sink);
            }
            AppCommand::ToggleMaintenance => self.wifi.toggle_maintenance(now_ms),
            AppCommand::SetMinStopCurrent(amps) => {
                if amps > MAX_MIN_STOP_A {
                    return Err(Error::Config("minimum-stop current must be 0-80 A"));
                }
                self.ctx.min_stop_current_a = amps;
                persist::save_min_stop(ports.store, amps)?;
                info!("ADMISSION: minimum-stop current {} A", amps);
            }
            AppCommand::SetWindow { weekday, window } => {
                ports.calendar.set_window(weekday, window)?;
                persist::save_window(ports.store, weekday, window)?;
            }
            AppCommand::SetDateTime(dt) => {
                ports.clock.set(dt, now_ms)?;
                ports.sink.emit(&AppEvent::DateTimeSynced(dt));
            }
            AppCommand::SetSsid(ssid) => {
                if !self.store_ssid(&ssid, ports.store) {
                    return Err(Error::Config("SSID rejected"));
                }
            }
            AppCommand::SetPassword(password) => {
                if !self.store_password(&password, ports.store) {
                    return Err(Error::Config("password rejected"));
                }
            }
            AppCommand::RestartWifi => self.wifi.restart(),
            AppCommand::UpdateConfig(new_config) => {
                config::validate(&new_config)?;
                ports.store.save(&new_config)?;
                self.ctx.low_current_interval_ms = new_config.low_current_interval_ms;
                self.config = new_config;
                info!("APP: configuration updated, engine timings apply after restart");
            }
            AppCommand::SaveConfig => {
                ports.store.save(&self.config)?;
                info!("APP: configuration saved");
            }
        }
        Ok(())
    }

    // ── Fatal path ────────────────────────────────────────────

    /// Latch a fatal condition: record it, disable the hardware and stop
    /// running the admission logic. Only the first call has an effect.
    pub fn trip_fatal(
        &mut self,
        reason: &'static str,
        now_ms: u32,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        if !self.fatal.trip(reason, now_ms) {
            return;
        }
        if let Err(e) = diagnostics::record_fatal(store, reason) {
            self.storage_failed(e);
        }
        self.ctx.enabled = false;
        self.ctx.enable_request = None;
        if self.rapi.set_enable(false).is_err() {
            error!("RAPI: disable dropped, queue full");
        }
        self.bridge.cancel();
        sink.emit(&AppEvent::Fatal(reason));
    }

    fn storage_failed(&mut self, e: StorageError) {
        let n = self.counters.bump(Counter::Storage);
        warn!("STORE: write failed ({}), {} so far", e, n);
    }

    fn refresh_snapshot(&mut self) {
        let status = self.rapi.status();
        self.snapshot.state = Some(self.fsm.current_state());
        self.snapshot.force = self.ctx.force;
        self.snapshot.current_ma = status.current_ma;
        self.snapshot.voltage_mv = status.voltage_mv;
        self.snapshot.session_wh = status.session_wh;
        self.snapshot.total_wh = status.total_wh;
        self.snapshot.min_stop_a = self.ctx.min_stop_current_a;
        self.snapshot.error_total = self.counters.total();
        self.snapshot.history.clear();
        self.history.render(&mut self.snapshot.history);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        let status = self.rapi.status();
        TelemetryData {
            state: self.fsm.current_state(),
            force: self.ctx.force,
            plug: status.plug_state(),
            current_ma: status.current_ma,
            voltage_mv: status.voltage_mv,
            session_wh: status.session_wh,
            total_wh: status.total_wh,
            wifi: self.wifi.state(),
            error_total: self.counters.total(),
        }
    }

    pub fn state(&self) -> AdmissionState {
        self.fsm.current_state()
    }

    pub fn force(&self) -> ForceLevel {
        self.ctx.force
    }

    /// Level last requested from the charging hardware.
    pub fn is_enabled(&self) -> bool {
        self.ctx.enabled
    }

    pub fn min_stop_current_a(&self) -> u8 {
        self.ctx.min_stop_current_a
    }

    pub fn counters(&self) -> &ErrorCounters {
        &self.counters
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn fatal_reason(&self) -> Option<&'static str> {
        self.fatal.reason()
    }

    pub fn is_halted(&self) -> bool {
        self.fatal.is_tripped()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn wifi(&self) -> &WifiEngine<W> {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut WifiEngine<W> {
        &mut self.wifi
    }

    pub fn bridge(&self) -> &SocketBridge {
        &self.bridge
    }

    pub fn rapi(&self) -> &RapiEngine<'a, R> {
        &self.rapi
    }

    pub fn rapi_mut(&mut self) -> &mut RapiEngine<'a, R> {
        &mut self.rapi
    }
}
