use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_3_MIN: i64 = Self::MS_IN_S * 60 * 3;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_S * 60 * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_S * 60 * 15;
    pub const MS_IN_30_MIN: i64 = Self::MS_IN_S * 60 * 30;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_2_H: i64 = Self::MS_IN_MIN * 60 * 2;
    pub const MS_IN_4_H: i64 = Self::MS_IN_MIN * 60 * 4;
    pub const MS_IN_6_H: i64 = Self::MS_IN_MIN * 60 * 6;
    pub const MS_IN_8_H: i64 = Self::MS_IN_MIN * 60 * 8;
    pub const MS_IN_12_H: i64 = Self::MS_IN_MIN * 60 * 12;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const MS_IN_3_D: i64 = Self::MS_IN_H * 24 * 3;
    pub const MS_IN_W: i64 = Self::MS_IN_D * 7;
    pub const MS_IN_1_M: i64 = Self::MS_IN_D * 30;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";

    /// Convert a Binance-style shorthand (e.g. `30m`, `1h`) to milliseconds.
    pub fn interval_from_string(interval: &str) -> Option<i64> {
        let ms = match interval {
            "1s" => Self::MS_IN_S,
            "1m" => Self::MS_IN_MIN,
            "3m" => Self::MS_IN_3_MIN,
            "5m" => Self::MS_IN_5_MIN,
            "15m" => Self::MS_IN_15_MIN,
            "30m" => Self::MS_IN_30_MIN,
            "1h" => Self::MS_IN_H,
            "2h" => Self::MS_IN_2_H,
            "4h" => Self::MS_IN_4_H,
            "6h" => Self::MS_IN_6_H,
            "8h" => Self::MS_IN_8_H,
            "12h" => Self::MS_IN_12_H,
            "1d" => Self::MS_IN_D,
            "3d" => Self::MS_IN_3_D,
            "1w" => Self::MS_IN_W,
            "1M" => Self::MS_IN_1_M,
            _ => return None,
        };
        Some(ms)
    }
}

// Time Helper functions

/// RFC 3339 with millisecond precision, `Z` suffix.
pub fn to_iso(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// ISO-8601 layouts that carry an explicit offset, tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y%m%dT%H%M%S%.f%z",
];

/// Basic-format UTC (`20240517T010000Z`).
const BASIC_UTC_FORMAT: &str = "%Y%m%dT%H%M%S%.fZ";

/// Calendar date (UTC) of a signal timestamp.
///
/// Offsets are always applied before the date is taken: RFC 3339, ISO-8601 with
/// a colon-less offset (`+0530`) and the basic form are all understood. A bare
/// `YYYY-MM-DD ...` prefix is accepted only when no offset follows the time,
/// which covers the backend's `"2023-07-21 14:00:00 (1h)"` form.
pub fn calendar_date_utc(timestamp: &str) -> Option<NaiveDate> {
    let trimmed = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, BASIC_UTC_FORMAT) {
        return Some(naive.date());
    }

    let head = trimmed.get(..10)?;
    let date = NaiveDate::parse_from_str(head, TimeUtils::STANDARD_TIME_FORMAT).ok()?;
    // An offset we could not parse means the local date is not the UTC date.
    if has_offset(time_token(&trimmed[10..])) {
        return None;
    }
    Some(date)
}

/// The time part following the date, e.g. `14:00:00` or `01:00:00+5`.
fn time_token(rest: &str) -> &str {
    rest.trim_start_matches(['T', 't', ' '])
        .split_whitespace()
        .next()
        .unwrap_or("")
}

fn has_offset(time: &str) -> bool {
    time.ends_with(['Z', 'z']) || time.contains(['+', '-'])
}

pub fn format_duration(ms: i64) -> String {
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}.{:03}s", secs, ms % 1000);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m {}s", mins, secs % 60);
    }
    let hours = mins / 60;
    format!("{}h {}m", hours, mins % 60)
}
