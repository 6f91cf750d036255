//! Fuzz target: `bridge::parse_frame` and `SocketBridge::accept`
//!
//! Feeds arbitrary socket lines to the bridge. It must never panic, a
//! parsed argument must be a suffix of the line, and a refused request
//! must leave no request pending.
//!
//! cargo fuzz run fuzz_socket_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use wallybox::bridge::{self, Decision, RESPONSE_CAP, SocketBridge};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    if let Some((_, arg)) = bridge::parse_frame(line) {
        assert!(line.trim_end_matches(['\r', '\n']).ends_with(arg));
    }

    let mut b = SocketBridge::new();
    match b.accept(line) {
        Decision::Ignore => assert!(!b.is_busy()),
        Decision::Reply(reply) => {
            assert!(reply.len() <= RESPONSE_CAP);
            assert!(reply.ends_with("\r\n"));
        }
        Decision::Execute(request) => {
            assert!(!request.is_delayed());
            assert!(!b.is_busy());
        }
        Decision::Defer(request, ticket) => {
            assert!(request.is_delayed());
            assert_eq!(b.pending(), Some(request.code()));
            assert!(b.complete(request.code(), ticket.wrapping_add(1), "x").is_none());
            assert!(b.is_busy());
        }
    }

    // a second line while busy is answered, never executed
    if b.is_busy() {
        assert!(matches!(b.accept("$06:$GS"), Decision::Reply(_)));
    }
});
