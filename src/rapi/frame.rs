//! RAPI wire framing: `<text>^<XX>\r`, where `XX` is the XOR of every byte
//! before `^` rendered as two uppercase hex digits.

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::ascii::{hex_digit, hex_value, xor_checksum};
use crate::error::RapiError;

/// Largest outbound frame, checksum and CR included.
pub const FRAME_CAP: usize = 64;

pub type Frame = Vec<u8, FRAME_CAP>;

/// Build the command text: base text followed by space-separated parameters.
pub fn format_text(base: &str, params: &[i32]) -> Result<String<FRAME_CAP>, RapiError> {
    let mut text = String::new();
    text.push_str(base).map_err(|_| RapiError::FrameTooLong)?;
    for p in params {
        write!(text, " {p}").map_err(|_| RapiError::FrameTooLong)?;
    }
    Ok(text)
}

/// Frame `text`. `known_sum`, when present, must equal the XOR of `text`
/// and saves recomputing it.
pub fn encode(text: &str, known_sum: Option<u8>) -> Result<Frame, RapiError> {
    let sum = known_sum.unwrap_or_else(|| xor_checksum(text.as_bytes()));
    debug_assert_eq!(sum, xor_checksum(text.as_bytes()));

    let mut frame = Frame::new();
    frame
        .extend_from_slice(text.as_bytes())
        .map_err(|_| RapiError::FrameTooLong)?;
    frame
        .extend_from_slice(&[b'^', hex_digit(sum >> 4), hex_digit(sum), b'\r'])
        .map_err(|_| RapiError::FrameTooLong)?;
    Ok(frame)
}

/// Check a received response (CR already stripped) and return the text
/// before `^`.
pub fn verify(response: &[u8]) -> Result<&[u8], RapiError> {
    let caret = response
        .iter()
        .rposition(|&b| b == b'^')
        .ok_or(RapiError::BadChecksum)?;
    let (body, tail) = response.split_at(caret);
    let [_, hi, lo] = tail else {
        return Err(RapiError::BadChecksum);
    };
    let (Some(hi), Some(lo)) = (hex_value(*hi), hex_value(*lo)) else {
        return Err(RapiError::BadChecksum);
    };
    if ((hi << 4) | lo) == xor_checksum(body) {
        Ok(body)
    } else {
        Err(RapiError::BadChecksum)
    }
}
