//! Timestamp parsing for form-submitted history rows.
//!
//! Two phases:
//! 1. Regional numeric form `D/M/Y[ H:Mi[:S[.fff]]]` (day first). Two-digit
//!    years are 2000+YY. Out-of-range components roll over (31/02/2024 is
//!    2 March). Fractional seconds are accepted and dropped.
//! 2. Generic calendar formats: RFC 3339, RFC 2822, ISO-like date/time with
//!    or without seconds and zone, and English long-form dates
//!    (`March 1, 2024`, `1 March 2024 08:00`, `Mar 1 2024`).
//!
//! Naive values are read as UTC. Anything else resolves to the epoch
//! sentinel, which sorts before every real event.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Naive date-time formats tried in phase 2, in order.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Zoned ISO-like forms not covered by RFC 3339 (missing seconds).
const ZONED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%d %H:%M %#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
];

/// English long forms. `%B` also matches abbreviated month names.
const LONG_DATETIME_FORMATS: &[&str] = &[
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

/// Instant used for empty or unparseable timestamps.
pub fn epoch_sentinel() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

pub fn is_epoch_sentinel(instant: &DateTime<Utc>) -> bool {
    *instant == epoch_sentinel()
}

/// Parse a history timestamp. Never fails; see module docs.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if raw.is_empty() {
        return epoch_sentinel();
    }

    parse_regional(raw)
        .or_else(|| parse_generic(raw))
        .unwrap_or_else(epoch_sentinel)
}

// ---------------------------------------------------------------------------
// Phase 1: D/M/Y[ H:Mi[:S]]
// ---------------------------------------------------------------------------

fn parse_regional(raw: &str) -> Option<DateTime<Utc>> {
    let (date_part, time_part) = match raw.split_once(char::is_whitespace) {
        Some((d, t)) => (d, Some(t.trim_start())),
        None => (raw, None),
    };

    let mut fields = date_part.split('/');
    let day = digits(fields.next()?, 1, 2)?;
    let month = digits(fields.next()?, 1, 2)?;
    let year = digits(fields.next()?, 2, 4)?;
    if fields.next().is_some() {
        return None;
    }
    let year = if year < 100 { 2000 + year } else { year };

    let (hour, minute, second) = match time_part {
        None => (0, 0, 0),
        Some(t) => {
            let mut fields = t.split(':');
            let hour = digits(fields.next()?, 1, 2)?;
            let minute = digits(fields.next()?, 1, 2)?;
            let second = match fields.next() {
                Some(s) => {
                    let (whole, fraction) = match s.split_once('.') {
                        Some((w, f)) => (w, Some(f)),
                        None => (s, None),
                    };
                    if let Some(f) = fraction {
                        digits(f, 1, 9)?;
                    }
                    digits(whole, 1, 2)?
                }
                None => 0,
            };
            if fields.next().is_some() {
                return None;
            }
            (hour, minute, second)
        }
    };

    rolled_over(year, month, day, hour, minute, second)
}

/// Parse `s` if it is `min..=max` ASCII digits.
fn digits(s: &str, min: usize, max: usize) -> Option<i64> {
    if s.len() < min || s.len() > max || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Build an instant from possibly out-of-range components by offsetting from
/// the first day of the (normalized) month.
fn rolled_over(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
) -> Option<DateTime<Utc>> {
    let month0 = month - 1;
    let y = i32::try_from(year + month0.div_euclid(12)).ok()?;
    let m = u32::try_from(month0.rem_euclid(12) + 1).ok()?;

    let first = NaiveDate::from_ymd_opt(y, m, 1)?.and_hms_opt(0, 0, 0)?;
    let offset = Duration::days(day - 1)
        + Duration::hours(hour)
        + Duration::minutes(minute)
        + Duration::seconds(second);

    first
        .checked_add_signed(offset)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// ---------------------------------------------------------------------------
// Phase 2: generic calendar formats
// ---------------------------------------------------------------------------

fn parse_generic(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let zoned = zulu_as_offset(raw);
    for fmt in ZONED_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&zoned, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS.iter().chain(LONG_DATETIME_FORMATS) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// `...Z` -> `...+00:00`, so one offset specifier covers both.
fn zulu_as_offset(raw: &str) -> String {
    match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_string(),
    }
}
