//! Status page content for the Wi-Fi module's web server.
//!
//! Implements [`ContentPort`]. Built fresh by the service for each Wi-Fi
//! poll: it reads a snapshot of the controller, writes clock and calendar
//! changes straight through, and records everything else as
//! [`CgiAction`]s for the service to apply.
//!
//! | SSI `(p1, p2)` | content |
//! |---|---|
//! | `(1, 0)` | weekday name |
//! | `(1, 1..=6)` | day, month name, year, hour, minute, second |
//! | `(1, 7..=13)` | window of Monday..Sunday, `Off` or `hh:mm-hh:mm` |
//! | `(2, 0..=6)` | admission state, forced level, current (A), voltage (V), session Wh, total Wh, minimum-stop current (A) |
//! | `(3, 0)` | admission history |
//! | `(3, 1)` | error counter total |
//!
//! | CGI `(p1, p2)` | value |
//! |---|---|
//! | `(1, 0)` | `d,m,y,h,min` sets the clock |
//! | `(1, 1..=7)` | `hh:mm,hh:mm` sets the Monday..Sunday window |
//! | `(2, 0)` | minimum-stop current (A) |
//! | `(2, 1)` | any value cycles the forced level |

use core::fmt::{self, Write};

use heapless::{String, Vec};
use log::{info, warn};

use crate::app::ports::{CalendarPort, ClockPort, ContentPort, DateTime, DayWindow, SSI_CAP};
use crate::ascii::scan_dec;
use crate::fsm::AdmissionState;
use crate::fsm::context::ForceLevel;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const UNKNOWN: &str = "---";

/// Longest rendered history.
pub const HISTORY_TEXT_CAP: usize = 96;

/// Controller values shown on the status page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: Option<AdmissionState>,
    pub force: ForceLevel,
    pub current_ma: i32,
    pub voltage_mv: i32,
    pub session_wh: u32,
    pub total_wh: u32,
    pub min_stop_a: u8,
    pub error_total: u32,
    pub history: String<HISTORY_TEXT_CAP>,
}

/// Form submissions the service has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgiAction {
    DateTimeSet(DateTime),
    WindowChanged { weekday: u8, window: DayWindow },
    SetMinStopCurrent(u8),
    CycleForce,
}

pub struct HtmlInfo<'a, C: ClockPort, K: CalendarPort> {
    snapshot: &'a StatusSnapshot,
    clock: &'a mut C,
    calendar: &'a mut K,
    now_ms: u32,
    actions: Vec<CgiAction, 4>,
}

impl<'a, C: ClockPort, K: CalendarPort> HtmlInfo<'a, C, K> {
    pub fn new(
        snapshot: &'a StatusSnapshot,
        clock: &'a mut C,
        calendar: &'a mut K,
        now_ms: u32,
    ) -> Self {
        Self {
            snapshot,
            clock,
            calendar,
            now_ms,
            actions: Vec::new(),
        }
    }

    /// Actions recorded by CGI submissions, oldest first.
    pub fn into_actions(self) -> Vec<CgiAction, 4> {
        self.actions
    }

    fn record(&mut self, action: CgiAction) {
        if self.actions.push(action).is_err() {
            warn!("HTML: too many form actions in one cycle, {:?} dropped", action);
        }
    }

    fn ssi_calendar(&self, field: u32, out: &mut String<SSI_CAP>) -> fmt::Result {
        let now = self.clock.now();
        match field {
            0 => {
                let name = WEEKDAYS.get(usize::from(now.weekday())).unwrap_or(&UNKNOWN);
                write!(out, "{}", name)
            }
            1 => write!(out, "{:02}", now.day),
            2 => {
                let idx = usize::from(now.month).wrapping_sub(1);
                write!(out, "{}", MONTHS.get(idx).unwrap_or(&UNKNOWN))
            }
            3 => write!(out, "{:04}", now.year),
            4 => write!(out, "{:02}", now.hour),
            5 => write!(out, "{:02}", now.minute),
            6 => write!(out, "{:02}", now.second),
            7..=13 => {
                let w = self.calendar.window((field - 7) as u8);
                if w.start_s == w.end_s {
                    write!(out, "Off")
                } else {
                    write!(
                        out,
                        "{:02}:{:02}-{:02}:{:02}",
                        w.start_s / 3600,
                        w.start_s % 3600 / 60,
                        w.end_s / 3600,
                        w.end_s % 3600 / 60
                    )
                }
            }
            _ => write!(out, "{}", UNKNOWN),
        }
    }

    fn ssi_charge(&self, field: u32, out: &mut String<SSI_CAP>) -> fmt::Result {
        let s = self.snapshot;
        match field {
            0 => write!(out, "{}", s.state.map_or(UNKNOWN, AdmissionState::name)),
            1 => write!(out, "{}", s.force.name()),
            2 => write_tenths(out, s.current_ma / 100),
            3 => write!(out, "{}", s.voltage_mv / 1000),
            4 => write!(out, "{}", s.session_wh),
            5 => write!(out, "{}", s.total_wh),
            6 => write!(out, "{}", s.min_stop_a),
            _ => write!(out, "{}", UNKNOWN),
        }
    }

    fn ssi_diagnostics(&self, field: u32, out: &mut String<SSI_CAP>) -> fmt::Result {
        match field {
            0 => write!(out, "{}", self.snapshot.history),
            1 => write!(out, "{}", self.snapshot.error_total),
            _ => write!(out, "{}", UNKNOWN),
        }
    }

    fn cgi_calendar(&mut self, field: u32, value: &str) {
        match field {
            0 => {
                let Some([day, month, year, hour, minute]) = scan_fields::<5>(value) else {
                    warn!("HTML: malformed date {:?}", value);
                    return;
                };
                // oversized fields saturate and fail validation
                let byte = |v: u32| u8::try_from(v).unwrap_or(u8::MAX);
                let dt = DateTime {
                    year: u16::try_from(year).unwrap_or(u16::MAX),
                    month: byte(month),
                    day: byte(day),
                    hour: byte(hour),
                    minute: byte(minute),
                    second: 0,
                };
                match self.clock.set(dt, self.now_ms) {
                    Ok(()) => self.record(CgiAction::DateTimeSet(dt)),
                    Err(e) => warn!("HTML: date rejected: {}", e),
                }
            }
            1..=7 => {
                let Some([sh, sm, eh, em]) = scan_fields::<4>(value) else {
                    warn!("HTML: malformed window {:?}", value);
                    return;
                };
                if sh > 23 || eh > 23 || sm > 59 || em > 59 {
                    warn!("HTML: window out of range {:?}", value);
                    return;
                }
                let weekday = (field - 1) as u8;
                let window = DayWindow {
                    start_s: sh * 3600 + sm * 60,
                    end_s: eh * 3600 + em * 60,
                };
                match self.calendar.set_window(weekday, window) {
                    Ok(()) => self.record(CgiAction::WindowChanged { weekday, window }),
                    Err(e) => warn!("HTML: window rejected: {}", e),
                }
            }
            _ => warn!("HTML: unknown calendar field {}", field),
        }
    }

    fn cgi_charge(&mut self, field: u32, value: &str) {
        match field {
            0 => match scan_fields::<1>(value) {
                Some([amps]) if amps <= u32::from(u8::MAX) => {
                    self.record(CgiAction::SetMinStopCurrent(amps as u8));
                }
                _ => warn!("HTML: bad minimum current {:?}", value),
            },
            1 => self.record(CgiAction::CycleForce),
            _ => warn!("HTML: unknown charge field {}", field),
        }
    }
}

impl<C: ClockPort, K: CalendarPort> ContentPort for HtmlInfo<'_, C, K> {
    fn ssi(&mut self, p1: u32, p2: u32, out: &mut String<SSI_CAP>) {
        out.clear();
        let written = match p1 {
            1 => self.ssi_calendar(p2, out),
            2 => self.ssi_charge(p2, out),
            3 => self.ssi_diagnostics(p2, out),
            _ => write!(out, "{}", UNKNOWN),
        };
        if written.is_err() {
            warn!("HTML: SSI {}:{} truncated", p1, p2);
        }
    }

    fn cgi(&mut self, p1: u32, p2: u32, value: &str) {
        info!("HTML: form {}:{} = {:?}", p1, p2, value);
        match p1 {
            1 => self.cgi_calendar(p2, value),
            2 => self.cgi_charge(p2, value),
            _ => warn!("HTML: unknown form {}", p1),
        }
    }
}

/// `123` tenths as `12.3`.
fn write_tenths(out: &mut String<SSI_CAP>, tenths: i32) -> fmt::Result {
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();
    write!(out, "{}{}.{}", sign, abs / 10, abs % 10)
}

/// Read `N` unsigned decimals separated by any non-digits.
fn scan_fields<const N: usize>(value: &str) -> Option<[u32; N]> {
    let bytes = value.as_bytes();
    let mut out = [0u32; N];
    let mut at = 0;
    for slot in &mut out {
        let (used, v) = scan_dec(&bytes[at..], false, i32::MAX);
        *slot = v? as u32;
        at += used;
    }
    Some(out)
}
