//! Word layout of the persistent store.
//!
//! ```text
//!  word  0        forced level
//!  word  1        minimum-stop current (A)
//!  words 2..16    calendar, 7 × (start, end) in minutes of day
//!  words 16..33   home SSID         (length word + 16 packed words)
//!  words 33..66   home password     (length word + 32 packed words)
//!  words 66..80   last fatal reason (length word + 13 packed words)
//!  words 80..241  SystemConfig postcard blob (length word + 160 packed words)
//! ```
//!
//! Erased cells read as `0xFFFF`. Every writer is write-through and skips
//! words that already hold the value, so repeated saves do not wear the
//! device.

use heapless::String;

use crate::app::ports::{CalendarPort, DayWindow, StorageError, StoragePort};
use crate::fsm::context::ForceLevel;

pub const ADDR_FORCE: u16 = 0;
pub const ADDR_MIN_STOP: u16 = 1;
pub const ADDR_CALENDAR: u16 = 2;
pub const ADDR_SSID: u16 = 16;
pub const ADDR_PASSWORD: u16 = 33;
pub const ADDR_FATAL: u16 = 66;
pub const ADDR_CONFIG: u16 = 80;

/// Packed words reserved for the SSID (32 bytes).
pub const SSID_WORDS: u16 = 16;
/// Packed words reserved for the password (64 bytes).
pub const PASSWORD_WORDS: u16 = 32;
/// Packed words reserved for the fatal reason.
pub const FATAL_WORDS: u16 = 13;
/// Packed words reserved for the configuration blob.
pub const CONFIG_WORDS: u16 = 160;

pub const ERASED: u16 = 0xFFFF;

/// Write `value` unless the cell already holds it.
pub fn write_if_changed(
    store: &mut impl StoragePort,
    addr: u16,
    value: u16,
) -> Result<bool, StorageError> {
    if store.read_word(addr)? == value {
        return Ok(false);
    }
    store.write_word(addr, value)?;
    Ok(true)
}

// ── Admission settings ────────────────────────────────────────

/// Erased or unknown values fall back to [`ForceLevel::None`].
pub fn load_force(store: &impl StoragePort) -> ForceLevel {
    store
        .read_word(ADDR_FORCE)
        .ok()
        .and_then(ForceLevel::from_word)
        .unwrap_or_default()
}

pub fn save_force(store: &mut impl StoragePort, force: ForceLevel) -> Result<bool, StorageError> {
    write_if_changed(store, ADDR_FORCE, force.as_word())
}

pub fn load_min_stop(store: &impl StoragePort, default_a: u8) -> u8 {
    match store.read_word(ADDR_MIN_STOP) {
        Ok(word) if word <= u16::from(u8::MAX) => word as u8,
        _ => default_a,
    }
}

pub fn save_min_stop(store: &mut impl StoragePort, amps: u8) -> Result<bool, StorageError> {
    write_if_changed(store, ADDR_MIN_STOP, u16::from(amps))
}

// ── Calendar ──────────────────────────────────────────────────

const MINUTES_PER_DAY: u16 = 24 * 60;

fn window_addr(weekday: u8) -> u16 {
    ADDR_CALENDAR + u16::from(weekday) * 2
}

/// Stored windows have minute resolution; `None` for erased or
/// out-of-range cells.
pub fn load_window(store: &impl StoragePort, weekday: u8) -> Option<DayWindow> {
    if weekday > 6 {
        return None;
    }
    let addr = window_addr(weekday);
    let start = store.read_word(addr).ok()?;
    let end = store.read_word(addr + 1).ok()?;
    if start >= MINUTES_PER_DAY || end >= MINUTES_PER_DAY {
        return None;
    }
    Some(DayWindow {
        start_s: u32::from(start) * 60,
        end_s: u32::from(end) * 60,
    })
}

pub fn save_window(
    store: &mut impl StoragePort,
    weekday: u8,
    window: DayWindow,
) -> Result<(), StorageError> {
    if weekday > 6 {
        return Err(StorageError::OutOfRange);
    }
    let addr = window_addr(weekday);
    write_if_changed(store, addr, (window.start_s / 60) as u16)?;
    write_if_changed(store, addr + 1, (window.end_s / 60) as u16)?;
    Ok(())
}

/// Copy every valid stored window into `calendar`. Returns how many
/// were applied.
pub fn restore_calendar(store: &impl StoragePort, calendar: &mut impl CalendarPort) -> usize {
    (0..7u8)
        .filter_map(|day| load_window(store, day).map(|w| (day, w)))
        .filter(|&(day, w)| calendar.set_window(day, w).is_ok())
        .count()
}

// ── Packed byte fields ────────────────────────────────────────

/// Store `bytes` as a length word followed by little-endian byte pairs.
pub fn write_bytes(
    store: &mut impl StoragePort,
    addr: u16,
    max_words: u16,
    bytes: &[u8],
) -> Result<(), StorageError> {
    if bytes.len() > usize::from(max_words) * 2 {
        return Err(StorageError::OutOfRange);
    }
    write_if_changed(store, addr, bytes.len() as u16)?;
    for (i, pair) in bytes.chunks(2).enumerate() {
        let lo = u16::from(pair[0]);
        let hi = pair.get(1).copied().map_or(0, u16::from);
        write_if_changed(store, addr + 1 + i as u16, lo | (hi << 8))?;
    }
    Ok(())
}

/// Read a field written by [`write_bytes`] into `out`. Returns the
/// length, or `None` when the field is erased or does not fit.
pub fn read_bytes(
    store: &impl StoragePort,
    addr: u16,
    max_words: u16,
    out: &mut [u8],
) -> Result<Option<usize>, StorageError> {
    let len = store.read_word(addr)?;
    if len == ERASED || len > max_words * 2 || usize::from(len) > out.len() {
        return Ok(None);
    }
    let len = usize::from(len);
    for i in 0..len.div_ceil(2) {
        let word = store.read_word(addr + 1 + i as u16)?;
        out[i * 2] = word as u8;
        if i * 2 + 1 < len {
            out[i * 2 + 1] = (word >> 8) as u8;
        }
    }
    Ok(Some(len))
}

pub fn save_text(
    store: &mut impl StoragePort,
    addr: u16,
    max_words: u16,
    text: &str,
) -> Result<(), StorageError> {
    write_bytes(store, addr, max_words, text.as_bytes())
}

/// `None` for erased, oversized or non-UTF-8 content.
pub fn load_text<const N: usize>(
    store: &impl StoragePort,
    addr: u16,
    max_words: u16,
) -> Option<String<N>> {
    let mut buf = [0u8; 64];
    let len = read_bytes(store, addr, max_words, &mut buf).ok()??;
    let text = core::str::from_utf8(&buf[..len]).ok()?;
    String::try_from(text).ok()
}
