//! Fuzz target: `rapi::frame::verify`
//!
//! Arbitrary response bytes must either be rejected or yield a body that
//! is a prefix of the input and re-encodes to the same frame.
//!
//! cargo fuzz run fuzz_rapi_verify

#![no_main]

use libfuzzer_sys::fuzz_target;
use wallybox::rapi::frame;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = frame::verify(data) else {
        return;
    };
    assert!(data.starts_with(body));
    assert_eq!(data.len(), body.len() + 3);

    if let Ok(text) = core::str::from_utf8(body)
        && let Ok(framed) = frame::encode(text, None)
    {
        assert_eq!(&framed[..framed.len() - 1], data);
    }
});
