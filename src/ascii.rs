//! Bounded ASCII scanning helpers shared by both protocol engines.
//!
//! Scanners work on byte slices and return `(consumed, value)` so callers
//! can walk a payload field by field. A scanner that finds no digit
//! returns `None` and consumes the whole input; decoders keep the previous
//! field value in that case.

use heapless::String;

/// Scan the next decimal number in `input`.
///
/// Non-digit bytes are skipped. When `signed` is set, a `-` directly in
/// front of the first digit negates the result; any other skipped byte
/// cancels a pending sign. The magnitude saturates at `max` while the rest
/// of the digit run is still consumed. Scanning stops at the first
/// non-digit after the number.
pub fn scan_dec(input: &[u8], signed: bool, max: i32) -> (usize, Option<i32>) {
    let mut idx = 0;
    let mut negative = false;

    while idx < input.len() && !input[idx].is_ascii_digit() {
        negative = signed && input[idx] == b'-';
        idx += 1;
    }
    if idx == input.len() {
        return (idx, None);
    }

    let limit = max.max(0) as u32;
    let mut value: u32 = 0;
    while idx < input.len() && input[idx].is_ascii_digit() {
        let digit = u32::from(input[idx] - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .map_or(limit, |v| v.min(limit));
        idx += 1;
    }

    let value = value as i32;
    (idx, Some(if negative { -value } else { value }))
}

/// Scan the next uppercase hexadecimal number in `input`.
///
/// Bytes that are not `0-9`/`A-F` are skipped; a `^` (checksum delimiter)
/// ends the scan without a value. The value saturates at `u32::MAX`.
pub fn scan_hex(input: &[u8]) -> (usize, Option<u32>) {
    let mut idx = 0;
    while idx < input.len() && hex_value(input[idx]).is_none() {
        if input[idx] == b'^' {
            return (idx, None);
        }
        idx += 1;
    }
    if idx == input.len() {
        return (idx, None);
    }

    let mut value: u32 = 0;
    while let Some(nibble) = input.get(idx).copied().and_then(hex_value) {
        value = value.checked_mul(16).map_or(u32::MAX, |v| v | u32::from(nibble));
        idx += 1;
    }
    (idx, Some(value))
}

/// Value of one uppercase hex digit.
pub const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Uppercase hex digit for the low nibble of `nibble`.
pub const fn hex_digit(nibble: u8) -> u8 {
    let n = nibble & 0x0F;
    if n < 10 { b'0' + n } else { b'A' + n - 10 }
}

/// XOR of every byte in `bytes`.
pub const fn xor_checksum(bytes: &[u8]) -> u8 {
    let mut sum = 0u8;
    let mut i = 0;
    while i < bytes.len() {
        sum ^= bytes[i];
        i += 1;
    }
    sum
}

/// Text after the last occurrence of `delim` (the whole input if absent),
/// with a trailing CR/LF removed.
pub fn rsplit_last(input: &str, delim: char) -> &str {
    let tail = input.rsplit_once(delim).map_or(input, |(_, tail)| tail);
    tail.trim_end_matches(['\r', '\n'])
}

/// Replace `dst` with as much of `src` as fits, cutting on a char boundary.
pub fn push_truncated<const N: usize>(dst: &mut String<N>, src: &str) {
    dst.clear();
    for ch in src.chars() {
        if dst.push(ch).is_err() {
            break;
        }
    }
}
