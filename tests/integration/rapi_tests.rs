//! Charging-hardware engine against a scripted serial link.

use crate::mock_hw::MockTransport;

use wallybox::config::SystemConfig;
use wallybox::error::{Error, QueueFull, RapiError};
use wallybox::rapi::command::RapiKind;
use wallybox::rapi::{QUEUE_SLOTS, RapiCell, RapiEngine, RapiEvent, frame};

fn events(eng: &mut RapiEngine<'_, MockTransport>) -> Vec<RapiEvent> {
    let mut out = Vec::new();
    eng.drain_events(|e| out.push(e));
    out
}

/// Answers `$OK` to everything except the reset frame.
fn always_ok() -> MockTransport {
    MockTransport::rapi_device(|cmd| (cmd != "$FR").then(|| "$OK".to_string()))
}

/// Bring an engine with an answering device past its warm-up.
fn warmed_up<'a>(cell: &'a RapiCell, cfg: &SystemConfig) -> RapiEngine<'a, MockTransport> {
    let mut eng = RapiEngine::new(always_ok(), cell, cfg);
    eng.init(0);
    eng.poll(0);
    eng.poll(10);
    eng.poll(cfg.rapi_warmup_ms);
    // drain the first poll set and the version read
    for step in 1..=8 {
        eng.poll(cfg.rapi_warmup_ms + step * 10);
    }
    assert!(eng.is_warmed_up());
    assert_eq!(eng.queue_len(), 0);
    eng.transport_mut().clear_sent();
    events(&mut eng);
    eng
}

// ── Retry budget ──────────────────────────────────────────────

#[test]
fn silent_device_gets_four_retries_then_one_reset() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let mut eng = RapiEngine::new(MockTransport::new(), &cell, &cfg);
    eng.init(0);
    eng.poll(0);

    for attempt in 1..=u32::from(cfg.rapi_max_retries) {
        eng.poll(attempt * cfg.rapi_timeout_ms);
    }
    assert_eq!(
        eng.transport().count_sent("$FE^27\r"),
        1 + usize::from(cfg.rapi_max_retries)
    );
    assert_eq!(eng.link_resets(), 0);

    let reset_at = (u32::from(cfg.rapi_max_retries) + 1) * cfg.rapi_timeout_ms;
    eng.poll(reset_at);
    assert_eq!(eng.link_resets(), 1);
    assert!(eng.has_link_fault());
    assert_eq!(eng.queue_len(), 0);
    assert_eq!(eng.transport().sent_commands().last().unwrap(), "$FR");
    assert_eq!(events(&mut eng), [RapiEvent::LinkReset { count: 1 }]);

    // the reset restarts the warm-up with an empty queue: nothing more goes out
    let sent = eng.transport().sent.len();
    for t in (reset_at + 1..reset_at + cfg.rapi_warmup_ms).step_by(250) {
        eng.poll(t);
    }
    assert_eq!(eng.transport().sent.len(), sent);
    assert!(events(&mut eng).is_empty());
}

#[test]
fn corrupted_checksum_resends_the_same_head() {
    let cell = RapiCell::new();
    let mut eng = RapiEngine::new(MockTransport::new(), &cell, &SystemConfig::default());
    eng.init(0);
    eng.poll(0);

    let mut bad = frame::encode("$OK", None).unwrap().to_vec();
    bad[2] ^= 0x04;
    eng.transport_mut().rx.extend(bad.iter());
    eng.poll(10);
    assert_eq!(eng.transport().count_sent("$FE^27\r"), 2);
    assert_eq!(eng.queue_len(), 1);
    assert!(events(&mut eng).is_empty());

    eng.transport_mut().push_rapi_reply("$OK");
    eng.poll(20);
    assert_eq!(eng.queue_len(), 0);
    assert_eq!(events(&mut eng), [RapiEvent::Response(RapiKind::Enable)]);
    assert!(!eng.has_link_fault());
}

#[test]
fn negative_answer_is_retried() {
    let cell = RapiCell::new();
    let mut eng = RapiEngine::new(MockTransport::new(), &cell, &SystemConfig::default());
    eng.init(0);
    eng.poll(0);

    eng.transport_mut().push_rapi_reply("$NK");
    eng.poll(10);
    assert_eq!(eng.transport().count_sent("$FE^27\r"), 2);
    assert_eq!(eng.queue_len(), 1);
}

// ── Ordering and warm-up ──────────────────────────────────────

#[test]
fn warm_up_holds_queries_then_polls_in_order() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let mut eng = RapiEngine::new(always_ok(), &cell, &cfg);
    eng.init(0);
    eng.enqueue(RapiKind::GetState, &[]).unwrap();

    for t in (0..cfg.rapi_warmup_ms).step_by(100) {
        eng.poll(t);
    }
    assert_eq!(eng.transport().sent_commands(), ["$FE"]);
    assert!(!eng.is_warmed_up());

    eng.poll(cfg.rapi_warmup_ms);
    for step in 1..=7 {
        eng.poll(cfg.rapi_warmup_ms + step * 10);
    }
    assert_eq!(
        eng.transport().sent_commands(),
        ["$FE", "$GS", "$GS", "$GG", "$GU", "$GF", "$GC", "$GV"]
    );
    assert_eq!(eng.queue_len(), 0);
}

#[test]
fn commands_leave_in_enqueue_order() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let mut eng = warmed_up(&cell, &cfg);
    let base = cfg.rapi_warmup_ms + 100;

    eng.enqueue(RapiKind::SetCurrentCap, &[16]).unwrap();
    eng.set_enable(false).unwrap();
    eng.enqueue(RapiKind::GetConnectState, &[]).unwrap();
    for step in 0..4 {
        eng.poll(base + step * 10);
    }
    assert_eq!(eng.transport().sent_commands(), ["$SC 16", "$FD", "$G0"]);
}

#[test]
fn full_queue_drops_the_newcomer_only() {
    let cell = RapiCell::new();
    let mut eng = RapiEngine::new(MockTransport::new(), &cell, &SystemConfig::default());
    eng.init(0);

    let fill = [
        RapiKind::GetState,
        RapiKind::GetChargeParams,
        RapiKind::GetEnergy,
        RapiKind::GetFaults,
        RapiKind::GetCurrentCap,
        RapiKind::GetVersion,
    ];
    for kind in fill {
        eng.enqueue(kind, &[]).unwrap();
    }
    assert_eq!(eng.queue_len(), QUEUE_SLOTS - 1);
    assert_eq!(eng.enqueue(RapiKind::Disable, &[]), Err(QueueFull));
    assert_eq!(eng.set_enable(true), Err(QueueFull));

    let kinds: Vec<_> = eng.queued_kinds().collect();
    assert_eq!(kinds[0], RapiKind::Enable);
    assert_eq!(&kinds[1..], &fill);
}

#[test]
fn idle_polls_change_nothing() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let mut eng = RapiEngine::new(always_ok(), &cell, &cfg);
    eng.init(0);
    eng.poll(0);
    eng.poll(10);
    events(&mut eng);
    let sent = eng.transport().sent.len();
    let status = eng.status().clone();

    for t in (20..cfg.rapi_warmup_ms).step_by(37) {
        eng.poll(t);
    }
    assert_eq!(eng.transport().sent.len(), sent);
    assert_eq!(*eng.status(), status);
    assert!(events(&mut eng).is_empty());
    assert!(!eng.is_busy());
}

// ── Status decoding ───────────────────────────────────────────

#[test]
fn poll_set_fills_the_status_snapshot() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let device = MockTransport::rapi_device(|cmd| {
        let reply = match cmd {
            "$FR" => return None,
            "$GS" => "$OK 3 120",
            "$GG" => "$OK 16000 230000",
            "$GU" => "$OK 36000 1234",
            "$GF" => "$OK 1 0 2",
            "$GC" => "$OK 6 32",
            "$GV" => "$OK 5.1.2 3.0.1",
            _ => "$OK",
        };
        Some(reply.to_string())
    });
    let mut eng = RapiEngine::new(device, &cell, &cfg);
    eng.init(0);
    eng.poll(0);
    eng.poll(10);
    eng.poll(cfg.rapi_warmup_ms);
    for step in 1..=6 {
        eng.poll(cfg.rapi_warmup_ms + step * 10);
    }

    let st = eng.status();
    assert!(st.is_charging());
    assert_eq!(st.elapsed_secs, 120);
    assert_eq!(st.current_ma, 16_000);
    assert_eq!(st.voltage_mv, 230_000);
    assert_eq!(st.session_wh, 10);
    assert_eq!(st.total_wh, 1234);
}

// ── Bridged raw commands ──────────────────────────────────────

#[test]
fn raw_command_returns_the_whole_answer() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let mut eng = warmed_up(&cell, &cfg);
    let base = cfg.rapi_warmup_ms + 100;

    eng.enqueue_raw("$GE", 1).unwrap();
    assert!(matches!(
        eng.enqueue_raw("$GS", 2),
        Err(Error::Rapi(RapiError::BridgeBusy))
    ));
    eng.poll(base);
    eng.poll(base + 10);

    let answer = frame::encode("$OK", None).unwrap();
    let expected = core::str::from_utf8(&answer[..answer.len() - 1]).unwrap();
    let got = events(&mut eng);
    assert_eq!(got.len(), 1);
    match &got[0] {
        RapiEvent::BridgeResponse { ticket, text, complete } => {
            assert_eq!(*ticket, 1);
            assert_eq!(text.as_str(), expected);
            assert!(*complete);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(!eng.is_bridge_pending());
}

#[test]
fn link_reset_times_out_a_pending_raw_command() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let mut eng = RapiEngine::new(MockTransport::new(), &cell, &cfg);
    eng.init(0);
    eng.enqueue_raw("$GV", 7).unwrap();

    eng.poll(0);
    for attempt in 1..=u32::from(cfg.rapi_max_retries) + 1 {
        eng.poll(attempt * cfg.rapi_timeout_ms);
    }

    let got = events(&mut eng);
    assert_eq!(got.len(), 2);
    assert!(matches!(
        &got[0],
        RapiEvent::BridgeResponse { ticket: 7, text, complete: true } if text.as_str() == "Timeout"
    ));
    assert_eq!(got[1], RapiEvent::LinkReset { count: 1 });
    assert!(!eng.is_bridge_pending());
}

#[test]
fn abandoned_raw_command_on_the_wire_does_not_answer_the_next() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let mut eng = warmed_up(&cell, &cfg);
    eng.transport_mut().responder = None;
    let base = cfg.rapi_warmup_ms + 100;

    eng.enqueue_raw("$GE", 1).unwrap();
    eng.poll(base);
    assert_eq!(eng.transport().sent_commands(), ["$GE"]);

    eng.abandon_raw();
    assert!(!eng.is_bridge_pending());
    eng.enqueue_raw("$GS", 2).unwrap();
    assert!(eng.is_bridge_pending());

    // the late answer to $GE ends that exchange silently
    eng.transport_mut().push_rapi_reply("$OK 32 0");
    eng.poll(base + 10);
    assert!(events(&mut eng).is_empty());
    assert_eq!(eng.transport().sent_commands(), ["$GE", "$GS"]);

    eng.transport_mut().push_rapi_reply("$OK 3 120");
    eng.poll(base + 20);
    let answer = frame::encode("$OK 3 120", None).unwrap();
    let expected = core::str::from_utf8(&answer[..answer.len() - 1]).unwrap();
    let got = events(&mut eng);
    assert_eq!(got.len(), 1);
    assert!(matches!(
        &got[0],
        RapiEvent::BridgeResponse { ticket: 2, text, complete: true } if text.as_str() == expected
    ));
    assert!(!eng.is_bridge_pending());
}

#[test]
fn abandoned_raw_command_still_queued_is_never_sent() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let mut eng = warmed_up(&cell, &cfg);
    let base = cfg.rapi_warmup_ms + 100;

    eng.enqueue_raw("$GE", 1).unwrap();
    eng.abandon_raw();
    assert!(!eng.is_bridge_pending());
    eng.poll(base);
    eng.poll(base + 10);

    assert!(eng.transport().sent.is_empty());
    assert!(events(&mut eng).is_empty());
    assert_eq!(eng.queue_len(), 0);
}

// ── Unsolicited input ─────────────────────────────────────────

#[test]
fn bytes_with_nothing_in_flight_are_drained() {
    let cell = RapiCell::new();
    let cfg = SystemConfig::default();
    let mut eng = warmed_up(&cell, &cfg);

    eng.transport_mut().push_rapi_reply("$AT 3 254 32 0");
    eng.poll(cfg.rapi_warmup_ms + 100);

    assert_eq!(eng.unsolicited_bytes(), 18);
    assert_eq!(cell.unsolicited_len(), 0);
    assert!(events(&mut eng).is_empty());
}
