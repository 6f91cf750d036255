//! AppService driven through its ports with mock hardware.

use crate::mock_hw::{FlakyStore, MockHardware, MockTransport, RecordingSink};

use wallybox::adapters::calendar::WeeklyCalendar;
use wallybox::adapters::clock::SoftClock;
use wallybox::app::commands::AppCommand;
use wallybox::app::events::{AppEvent, Engine};
use wallybox::app::ports::{DayWindow, Indicator};
use wallybox::app::service::{AppService, Ports};
use wallybox::config::SystemConfig;
use wallybox::diagnostics;
use wallybox::drivers::led::LedColor;
use wallybox::fsm::AdmissionState;
use wallybox::fsm::context::ForceLevel;
use wallybox::persist;
use wallybox::rapi::RapiCell;
use wallybox::rapi::command::RapiKind;

type App<'a> = AppService<'a, MockTransport, MockTransport>;

struct Bench {
    hw: MockHardware,
    store: FlakyStore,
    clock: SoftClock,
    calendar: WeeklyCalendar,
    sink: RecordingSink,
}

impl Bench {
    fn new() -> Self {
        Self {
            hw: MockHardware::new(),
            store: FlakyStore::new(),
            clock: SoftClock::new(),
            calendar: WeeklyCalendar::new(),
            sink: RecordingSink::new(),
        }
    }

    fn ports(&mut self) -> Ports<'_, MockHardware, FlakyStore, SoftClock, WeeklyCalendar, RecordingSink> {
        Ports {
            hw: &mut self.hw,
            store: &mut self.store,
            clock: &mut self.clock,
            calendar: &mut self.calendar,
            sink: &mut self.sink,
        }
    }
}

fn started<'a>(cell: &'a RapiCell, bench: &mut Bench) -> App<'a> {
    let mut app = AppService::new(
        SystemConfig::default(),
        MockTransport::new(),
        MockTransport::new(),
        cell,
    );
    app.start(0, &mut bench.ports());
    app
}

/// Press for two filter periods, release for two more.
fn short_press(app: &mut App<'_>, bench: &mut Bench, at: u32) {
    for (dt, pressed) in [(0, true), (100, true), (200, false), (300, false)] {
        bench.hw.pressed = pressed;
        app.cycle(at + dt, &mut bench.ports());
    }
}

// ── Panel ─────────────────────────────────────────────────────

#[test]
fn three_short_presses_cycle_force_back_to_none() {
    let cell = RapiCell::new();
    let mut bench = Bench::new();
    let mut app = started(&cell, &mut bench);

    short_press(&mut app, &mut bench, 0);
    assert_eq!(app.force(), ForceLevel::MinCurrentOnly);
    assert_eq!(app.state(), AdmissionState::ForceWait);
    assert!(app.is_enabled());

    short_press(&mut app, &mut bench, 400);
    assert_eq!(app.force(), ForceLevel::Always);

    short_press(&mut app, &mut bench, 800);
    assert_eq!(app.force(), ForceLevel::None);
    assert_eq!(app.state(), AdmissionState::Off);
    assert!(!app.is_enabled());
    assert_eq!(persist::load_force(&bench.store), ForceLevel::None);

    let levels: Vec<_> = bench
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ForceLevelChanged(level) => Some(*level),
            _ => None,
        })
        .collect();
    assert_eq!(
        levels,
        [ForceLevel::MinCurrentOnly, ForceLevel::Always, ForceLevel::None]
    );
    assert!(bench.sink.contains(&AppEvent::EnableChanged(true)));
    assert!(bench.sink.contains(&AppEvent::EnableChanged(false)));
}

#[test]
fn long_press_toggles_maintenance() {
    let cell = RapiCell::new();
    let mut bench = Bench::new();
    let mut app = started(&cell, &mut bench);
    let long = app.config().long_press_ms;

    bench.hw.pressed = true;
    app.cycle(0, &mut bench.ports());
    app.cycle(100, &mut bench.ports());
    bench.hw.pressed = false;
    app.cycle(100 + long, &mut bench.ports());
    app.cycle(200 + long, &mut bench.ports());

    assert!(app.wifi().is_maintenance());
    assert_eq!(app.force(), ForceLevel::None, "a long press is not a short one");
    assert!(bench.sink.contains(&AppEvent::MaintenanceChanged(true)));
    assert_eq!(bench.hw.last_colour(Indicator::Wifi), Some(LedColor::Blue.rgb()));
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn storage_failure_is_counted_not_fatal() {
    let cell = RapiCell::new();
    let mut bench = Bench::new();
    let mut app = started(&cell, &mut bench);
    bench.store.fail_writes = true;

    app.handle_command(AppCommand::SetForce(ForceLevel::Always), 10, &mut bench.ports())
        .unwrap();
    assert_eq!(app.force(), ForceLevel::Always);
    assert_eq!(app.counters().storage_errors, 1);

    assert!(app
        .handle_command(AppCommand::SetMinStopCurrent(6), 20, &mut bench.ports())
        .is_err());
    assert!(!app.is_halted());
}

#[test]
fn form_submissions_set_the_clock_and_open_a_window() {
    let cell = RapiCell::new();
    let mut bench = Bench::new();
    let mut app = started(&cell, &mut bench);

    // Monday 2026-10-19 10:04, window 08:00-18:00 on Mondays
    app.wifi_mut()
        .transport_mut()
        .push_rx("+CGI:1:0:19,10,2026,10,4\r\n+CGI:1:1:08:00,18:00\r\n");
    app.cycle(10, &mut bench.ports());

    let window = DayWindow {
        start_s: 8 * 3600,
        end_s: 18 * 3600,
    };
    assert_eq!(persist::load_window(&bench.store, 0), Some(window));
    assert_eq!(
        bench.sink.count(|e| matches!(e, AppEvent::DateTimeSynced(_))),
        1
    );
    assert_eq!(app.state(), AdmissionState::OnWait);
    assert!(bench.sink.contains(&AppEvent::EnableChanged(true)));
}

#[test]
fn config_updates_are_validated_before_saving() {
    let cell = RapiCell::new();
    let mut bench = Bench::new();
    let mut app = started(&cell, &mut bench);

    let mut bad = SystemConfig::default();
    bad.rapi_timeout_ms = 1;
    assert!(app
        .handle_command(AppCommand::UpdateConfig(bad), 10, &mut bench.ports())
        .is_err());
    assert!(bench.store.saved_config.is_none());
    assert_eq!(*app.config(), SystemConfig::default());

    let mut good = SystemConfig::default();
    good.low_current_interval_ms = 60_000;
    app.handle_command(AppCommand::UpdateConfig(good.clone()), 20, &mut bench.ports())
        .unwrap();
    assert_eq!(bench.store.saved_config, Some(good.clone()));
    assert_eq!(*app.config(), good);
}

// ── Hardware link ─────────────────────────────────────────────

#[test]
fn link_reset_reissues_the_enable_level() {
    let cell = RapiCell::new();
    let mut bench = Bench::new();
    let mut app = started(&cell, &mut bench);
    let cfg = app.config().clone();

    app.handle_command(AppCommand::SetForce(ForceLevel::Always), 0, &mut bench.ports())
        .unwrap();
    app.cycle(0, &mut bench.ports());
    assert_eq!(app.state(), AdmissionState::ForceWait);
    assert_eq!(bench.sink.count(|e| *e == AppEvent::EnableChanged(true)), 1);

    // the hardware never answers
    for attempt in 1..=u32::from(cfg.rapi_max_retries) + 1 {
        app.cycle(attempt * cfg.rapi_timeout_ms, &mut bench.ports());
    }

    assert!(bench.sink.contains(&AppEvent::HardwareLinkReset { count: 1 }));
    assert_eq!(app.counters().rapi_link_resets, 1);
    assert_eq!(bench.sink.count(|e| *e == AppEvent::EnableChanged(true)), 2);
    let kinds: Vec<_> = app.rapi().queued_kinds().collect();
    assert_eq!(kinds, [RapiKind::Enable]);
}

#[test]
fn blocked_enable_is_reported_once_and_retried() {
    let cell = RapiCell::new();
    let mut bench = Bench::new();
    let mut app = started(&cell, &mut bench);

    // fill the queue behind the warm-up enable
    for _ in 0..app.rapi().queue_free() {
        app.rapi_mut().enqueue(RapiKind::GetState, &[]).unwrap();
    }
    app.handle_command(AppCommand::SetForce(ForceLevel::Always), 0, &mut bench.ports())
        .unwrap();
    for t in [0, 10, 20] {
        app.cycle(t, &mut bench.ports());
    }
    let overflow = |e: &AppEvent| *e == AppEvent::QueueOverflow(Engine::Rapi);
    assert_eq!(bench.sink.count(overflow), 1);
    assert_eq!(app.counters().rapi_queue_full, 1);
    assert_eq!(bench.sink.count(|e| matches!(e, AppEvent::EnableChanged(_))), 0);

    // the warm-up enable is answered and frees a slot
    app.rapi_mut().transport_mut().push_rapi_reply("$OK");
    app.cycle(30, &mut bench.ports());
    assert_eq!(bench.sink.count(|e| *e == AppEvent::EnableChanged(true)), 1);
    assert_eq!(bench.sink.count(overflow), 1);
}

// ── Fatal path ────────────────────────────────────────────────

#[test]
fn stuck_module_transmitter_halts_the_controller() {
    let cell = RapiCell::new();
    let mut bench = Bench::new();
    let mut app = started(&cell, &mut bench);

    app.wifi_mut().transport_mut().send_done = false;
    app.wifi_mut().transport_mut().push_rx("+WIND:56:Input:1:0");
    app.cycle(10, &mut bench.ports());

    assert!(app.is_halted());
    assert_eq!(app.fatal_reason(), Some("wifi inline send"));
    assert!(bench.sink.contains(&AppEvent::Fatal("wifi inline send")));
    assert_eq!(
        diagnostics::last_fatal(&bench.store).unwrap().as_str(),
        "wifi inline send"
    );
    assert!(app.rapi().queued_kinds().any(|k| k == RapiKind::Disable));
    assert!(app
        .handle_command(AppCommand::CycleForce, 20, &mut bench.ports())
        .is_err());
    assert_eq!(bench.hw.last_colour(Indicator::Charge), Some(LedColor::Red.rgb()));

    // the next boot reports and clears the record
    let cell = RapiCell::new();
    let mut next = AppService::new(
        SystemConfig::default(),
        MockTransport::new(),
        MockTransport::new(),
        &cell,
    );
    next.start(0, &mut bench.ports());
    assert!(diagnostics::last_fatal(&bench.store).is_none());
    assert!(!next.is_halted());
}
