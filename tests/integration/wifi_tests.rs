//! Wi-Fi module engine against scripted module output.

use heapless::String;

use crate::mock_hw::MockTransport;

use wallybox::app::ports::{ContentPort, DateTime, SSI_CAP};
use wallybox::config::SystemConfig;
use wallybox::wifi::command::EventText;
use wallybox::wifi::{CONFIG_FAILURES_BEFORE_RESET, QUEUE_SLOTS, WifiEngine, WifiEvent, WifiState};

/// Status page without any content.
struct BlankPage;

impl ContentPort for BlankPage {
    fn ssi(&mut self, _p1: u32, _p2: u32, _out: &mut String<SSI_CAP>) {}
    fn cgi(&mut self, _p1: u32, _p2: u32, _value: &str) {}
}

const CONSOLE: &str = "+WIND:0:Console active\r\n";
const POWER_ON: &str = "+WIND:1:Poweron (SPWF01S-160129-c5bf5ce-RELEASE)\r\n";
const HW_STARTED: &str = "+WIND:32:WiFi Hardware Started\r\n";

fn engine() -> WifiEngine<MockTransport> {
    let mut eng = WifiEngine::new(MockTransport::new(), &SystemConfig::default());
    eng.set_credentials("home", "secret");
    eng
}

fn feed(eng: &mut WifiEngine<MockTransport>, text: &str, now: u32) {
    eng.transport_mut().push_rx(text);
    eng.poll(now, &mut BlankPage);
}

fn events(eng: &mut WifiEngine<MockTransport>) -> Vec<WifiEvent> {
    let mut out = Vec::new();
    eng.drain_events(|e| out.push(e));
    out
}

/// Boot, answer the whole station configuration and bring the link up.
/// Returns with the socket server command acknowledged at t = 110.
fn connected() -> WifiEngine<MockTransport> {
    let mut eng = engine();
    feed(&mut eng, &format!("{CONSOLE}{POWER_ON}{HW_STARTED}"), 0);
    for i in 0..6 {
        feed(&mut eng, "OK\r\n", 10 + i);
    }
    feed(&mut eng, "+WIND:24:WiFi Up:192.168.1.20\r\n", 100);
    feed(&mut eng, "OK\r\n", 110);
    assert_eq!(eng.state(), WifiState::Connected);
    events(&mut eng);
    eng.transport_mut().clear_sent();
    eng
}

/// [`connected`] plus a socket client and data mode, at t = 130.
fn in_data_mode() -> WifiEngine<MockTransport> {
    let mut eng = connected();
    feed(&mut eng, "+WIND:61:Incoming Socket Client:10.0.0.9\r\n", 120);
    assert_eq!(eng.transport().sent_text(), ["AT+S.\r"]);
    feed(&mut eng, "OK\r\n+WIND:60:Now in Data Mode\r\n", 130);
    assert!(eng.flags().data_mode);
    eng.transport_mut().clear_sent();
    events(&mut eng);
    eng
}

// ── Readiness ─────────────────────────────────────────────────

#[test]
fn readiness_needs_all_three_events_in_any_order() {
    let orders = [
        [CONSOLE, POWER_ON, HW_STARTED],
        [CONSOLE, HW_STARTED, POWER_ON],
        [POWER_ON, CONSOLE, HW_STARTED],
        [POWER_ON, HW_STARTED, CONSOLE],
        [HW_STARTED, CONSOLE, POWER_ON],
        [HW_STARTED, POWER_ON, CONSOLE],
    ];

    for order in orders {
        let mut eng = engine();
        for (i, line) in order.iter().enumerate() {
            feed(&mut eng, line, i as u32 * 10);
            let got = events(&mut eng);
            if i < 2 {
                assert_eq!(eng.state(), WifiState::Off, "order {order:?}, step {i}");
                assert!(got.is_empty());
                assert!(eng.transport().sent.is_empty());
            } else {
                assert_eq!(
                    got[0],
                    WifiEvent::StateChanged {
                        from: WifiState::Off,
                        to: WifiState::Idle
                    }
                );
                assert_eq!(eng.state(), WifiState::Connecting);
            }
        }
    }
}

#[test]
fn idle_polls_write_nothing() {
    let mut eng = engine();
    for t in 0..100 {
        eng.poll(t * 10, &mut BlankPage);
    }
    assert!(eng.transport().sent.is_empty());
    assert!(events(&mut eng).is_empty());
    assert_eq!(eng.state(), WifiState::Off);

    let mut eng = connected();
    let housekeeping = SystemConfig::default().wifi_housekeeping_ms;
    for t in (200..housekeeping).step_by(1_000) {
        eng.poll(t, &mut BlankPage);
    }
    assert!(eng.transport().sent.is_empty());
    assert!(events(&mut eng).is_empty());
    assert_eq!(eng.queue_len(), 0);
}

// ── Queue ─────────────────────────────────────────────────────

#[test]
fn full_queue_reports_once_and_keeps_entries() {
    let mut eng = engine();
    for i in 0..QUEUE_SLOTS - 1 {
        eng.enqueue_ext(&format!("AT+S.PING=host{i}"), i as u32).unwrap();
    }
    assert!(eng.enqueue_ext("AT+S.STS", 99).is_err());
    assert_eq!(events(&mut eng), [WifiEvent::QueueFull]);

    let texts: Vec<_> = eng.queued().map(|e| e.text.as_str().to_owned()).collect();
    assert_eq!(texts.len(), QUEUE_SLOTS - 1);
    assert_eq!(texts[0], "AT+S.PING=host0\r");
    assert_eq!(texts[QUEUE_SLOTS - 2], format!("AT+S.PING=host{}\r", QUEUE_SLOTS - 2));
}

#[test]
fn error_answer_counts_and_is_bridged() {
    let mut eng = connected();
    eng.enqueue_ext("AT+S.NOPE", 1).unwrap();
    eng.poll(200, &mut BlankPage);
    assert_eq!(eng.transport().sent_text(), ["AT+S.NOPE\r"]);

    feed(&mut eng, "ERROR: Command not found\r\n", 210);
    assert_eq!(
        events(&mut eng),
        [WifiEvent::BridgeResponse {
            ticket: 1,
            text: EventText::try_from("ERROR").unwrap(),
        }]
    );
    assert_eq!(eng.command_errors(), 1);
    assert_eq!(eng.state(), WifiState::Connected);
}

#[test]
fn restart_answers_bridged_commands_it_drops() {
    let mut eng = connected();
    eng.enqueue_ext("AT+S.STS", 5).unwrap();
    eng.restart();

    assert_eq!(eng.queue_len(), 0);
    assert!(events(&mut eng).contains(&WifiEvent::BridgeResponse {
        ticket: 5,
        text: EventText::try_from("ERROR").unwrap(),
    }));
}

// ── Housekeeping ──────────────────────────────────────────────

#[test]
fn housekeeping_recovers_the_clock_from_http() {
    let mut eng = connected();
    let due = 100 + SystemConfig::default().wifi_housekeeping_ms;
    eng.poll(due, &mut BlankPage);
    assert_eq!(eng.transport().sent_text(), ["AT+S.PING=192.168.1.254\r"]);
    assert_eq!(eng.queue_len(), 2);

    feed(&mut eng, "Reply from 192.168.1.254: time=3 ms\r\nOK\r\n", due + 10);
    assert_eq!(eng.transport().sent_text().last().unwrap(), "AT+S.SCAN\r");

    feed(&mut eng, "+SCAN:BSS 00:11:22:33:44:55 CHAN: 06\r\nOK\r\n", due + 20);
    assert_eq!(
        eng.transport().sent_text().last().unwrap(),
        "AT+S.HTTPGET=www.google.com,/\r"
    );

    feed(
        &mut eng,
        "HTTP/1.1 200 OK\r\nDate: Mon, 19 Oct 2026 10:04:05 GMT\r\n\r\nOK\r\n",
        due + 30,
    );
    let expected = DateTime {
        year: 2026,
        month: 10,
        day: 19,
        hour: 10,
        minute: 4,
        second: 5,
    };
    assert_eq!(events(&mut eng), [WifiEvent::TimeSync(expected)]);
    assert_eq!(expected.weekday(), 0);
}

#[test]
fn unreachable_gateway_is_counted_and_housekeeping_goes_on() {
    let mut eng = connected();
    let due = 100 + SystemConfig::default().wifi_housekeeping_ms;
    eng.poll(due, &mut BlankPage);
    feed(&mut eng, "ERROR: Ping failed\r\n", due + 10);

    assert_eq!(eng.command_errors(), 1);
    assert_eq!(eng.state(), WifiState::Connected);
    assert_eq!(eng.transport().sent_text().last().unwrap(), "AT+S.SCAN\r");
}

#[test]
fn empty_gateway_skips_the_ping() {
    let mut config = SystemConfig::default();
    config.gateway_host.clear();
    let mut eng = WifiEngine::new(MockTransport::new(), &config);
    eng.set_credentials("home", "secret");
    feed(&mut eng, &format!("{CONSOLE}{POWER_ON}{HW_STARTED}"), 0);
    for i in 0..6 {
        feed(&mut eng, "OK\r\n", 10 + i);
    }
    feed(&mut eng, "+WIND:24:WiFi Up:192.168.1.20\r\n", 100);
    feed(&mut eng, "OK\r\n", 110);
    eng.transport_mut().clear_sent();

    eng.poll(100 + config.wifi_housekeeping_ms, &mut BlankPage);
    assert_eq!(eng.transport().sent_text(), ["AT+S.SCAN\r"]);
}

// ── Recovery ──────────────────────────────────────────────────

#[test]
fn repeated_configuration_failures_restore_factory_settings() {
    let mut eng = engine();
    feed(&mut eng, &format!("{CONSOLE}{POWER_ON}{HW_STARTED}"), 0);
    assert_eq!(eng.transport().sent_text(), ["AT\r"]);

    for run in 1..CONFIG_FAILURES_BEFORE_RESET {
        feed(&mut eng, "ERROR\r\n", u32::from(run) * 10);
        assert_eq!(eng.transport().sent_text().last().unwrap(), "AT\r");
        assert_eq!(eng.state(), WifiState::Connecting);
    }
    feed(&mut eng, "ERROR\r\n", 100);
    assert_eq!(eng.transport().sent_text().last().unwrap(), "AT&F\r");
    assert_eq!(eng.state(), WifiState::Idle, "configuration waits for a free slot");

    feed(&mut eng, "OK\r\n", 110);
    assert_eq!(eng.state(), WifiState::Connecting);
    assert_eq!(eng.transport().sent_text().last().unwrap(), "AT\r");
    assert_eq!(
        eng.transport().count_sent("AT\r"),
        usize::from(CONFIG_FAILURES_BEFORE_RESET) + 1
    );
    assert_eq!(eng.transport().count_sent("AT&F\r"), 1);
    assert_eq!(eng.command_errors(), u32::from(CONFIG_FAILURES_BEFORE_RESET));
}

// ── Data mode ─────────────────────────────────────────────────

#[test]
fn queued_command_escapes_data_mode_first() {
    let mut eng = in_data_mode();
    eng.enqueue_ext("AT+S.STS", 4).unwrap();
    eng.poll(140, &mut BlankPage);
    assert_eq!(eng.transport().sent_text(), ["at+s."]);

    feed(&mut eng, "+WIND:59:Back to Command Mode\r\n", 150);
    assert!(!eng.flags().data_mode);
    assert_eq!(eng.transport().sent_text().last().unwrap(), "AT+S.STS\r");

    feed(&mut eng, "OK\r\n", 160);
    assert_eq!(
        events(&mut eng),
        [WifiEvent::BridgeResponse {
            ticket: 4,
            text: EventText::try_from("OK").unwrap(),
        }]
    );
    // back to data mode once the queue is empty
    assert_eq!(eng.transport().sent_text().last().unwrap(), "AT+S.\r");
}

#[test]
fn idle_data_mode_falls_back_to_commands() {
    let mut eng = in_data_mode();
    let idle = SystemConfig::default().data_mode_idle_ms;
    eng.poll(130 + idle - 1, &mut BlankPage);
    assert!(eng.transport().sent.is_empty());
    eng.poll(130 + idle, &mut BlankPage);
    assert_eq!(eng.transport().sent_text(), ["at+s."]);
}

#[test]
fn client_leaving_discards_pending_payload() {
    let mut eng = in_data_mode();
    eng.send_socket(b"$85:WallyBox\r\n").unwrap();
    assert_eq!(eng.socket_pending(), 14);
    eng.transport_mut().send_done = false;
    feed(&mut eng, "+WIND:62:Socket Client Gone\r\n", 140);
    assert_eq!(eng.socket_pending(), 0);
    assert!(eng.send_socket(b"late").is_err());
    assert!(eng.client_ip().is_empty());
}
