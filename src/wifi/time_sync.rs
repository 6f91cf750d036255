//! Wall-clock recovery from an HTTP `Date:` header.
//!
//! `Date: Mon, 19 Oct 2026 10:04:05 GMT`

use crate::app::ports::DateTime;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_from_abbrev(token: &str) -> Option<u8> {
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(token))
        .map(|i| i as u8 + 1)
}

/// Find a `Date:` header in `text` and parse it. Returns `None` for a
/// missing header or an impossible date.
pub fn parse_http_date(text: &str) -> Option<DateTime> {
    let start = text.find("Date:")?;
    let rest = &text[start + "Date:".len()..];
    let rest = rest.split_once(',').map_or(rest, |(_, tail)| tail);

    let mut fields = rest.split_whitespace();
    let day = fields.next()?.parse().ok()?;
    let month = month_from_abbrev(fields.next()?)?;
    let year = fields.next()?.parse().ok()?;
    let mut hms = fields.next()?.split(':');
    let hour = hms.next()?.parse().ok()?;
    let minute = hms.next()?.parse().ok()?;
    let second = hms.next()?.parse().ok()?;

    let dt = DateTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
    };
    dt.is_valid().then_some(dt)
}
