//! Null-coercing parsers for raw table cells.
//!
//! Every function here maps an unparsable value to `None`; none of them fail.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Unit applied to a duration cell holding a bare number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Seconds,
    #[default]
    Minutes,
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%b %d, %Y %I:%M:%S %p",
    "%b %d, %Y %H:%M:%S",
];

/// Parses a number, treating NaN and infinities as missing.
pub fn to_numeric(raw: Option<&str>) -> Option<f64> {
    let value: f64 = raw?.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parses a timestamp in any of the common export formats. Offsets are
/// normalized to UTC.
pub fn to_datetime(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parses a time span.
///
/// Accepted spellings: `HH:MM:SS[.fff]`, `D days HH:MM:SS`, unit strings such
/// as `45min`, `1h 30m` or `90 s`, and bare numbers interpreted in `bare_unit`.
pub fn to_timedelta(raw: Option<&str>, bare_unit: DurationUnit) -> Option<TimeDelta> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, raw),
    };

    let span = if let Ok(number) = body.parse::<f64>() {
        let seconds = match bare_unit {
            DurationUnit::Seconds => number,
            DurationUnit::Minutes => number * 60.0,
        };
        from_seconds(seconds)?
    } else if body.contains(':') {
        parse_clock(body)?
    } else {
        parse_units(body)?
    };

    Some(if negative { -span } else { span })
}

/// `None` for spans a `TimeDelta` cannot hold.
fn from_seconds(seconds: f64) -> Option<TimeDelta> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

/// `[D day[s][,]] HH:MM:SS[.fff]`
fn parse_clock(body: &str) -> Option<TimeDelta> {
    let (days, clock) = match body.split_once("day") {
        Some((days, rest)) => {
            let days: i64 = days.trim().parse().ok()?;
            let rest = rest.strip_prefix('s').unwrap_or(rest);
            let rest = rest.trim_start_matches(',').trim();
            (days, rest)
        }
        None => (0, body),
    };

    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.trim().parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(0..60).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    let total = days as f64 * 86_400.0 + hours as f64 * 3_600.0 + minutes as f64 * 60.0 + seconds;
    from_seconds(total)
}

/// One or more `<number><unit>` pairs, optionally space separated.
fn parse_units(body: &str) -> Option<TimeDelta> {
    let mut total = 0.0;
    let mut rest = body.trim();
    let mut matched = false;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number: f64 = rest[..number_end].parse().ok()?;
        rest = rest[number_end..].trim_start();

        let unit_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let factor = unit_seconds(&rest[..unit_end].to_ascii_lowercase())?;
        rest = rest[unit_end..].trim_start_matches([' ', ',']);

        total += number * factor;
        matched = true;
    }

    if matched { from_seconds(total) } else { None }
}

fn unit_seconds(unit: &str) -> Option<f64> {
    match unit {
        "d" | "day" | "days" => Some(86_400.0),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(3_600.0),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60.0),
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1.0),
        "ms" | "milliseconds" => Some(0.001),
        _ => None,
    }
}

/// Renders a span as fractional minutes.
pub fn minutes(span: TimeDelta) -> f64 {
    span.num_milliseconds() as f64 / 60_000.0
}

/// Renders a span as fractional seconds.
pub fn seconds(span: TimeDelta) -> f64 {
    span.num_milliseconds() as f64 / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mins(raw: &str) -> Option<f64> {
        to_timedelta(Some(raw), DurationUnit::Minutes).map(minutes)
    }

    #[test]
    fn test_to_numeric() {
        assert_eq!(to_numeric(Some("13.5")), Some(13.5));
        assert_eq!(to_numeric(Some(" -89.2 ")), Some(-89.2));
        assert_eq!(to_numeric(Some("abc")), None);
        assert_eq!(to_numeric(Some("NaN")), None);
        assert_eq!(to_numeric(Some("inf")), None);
        assert_eq!(to_numeric(Some("-infinity")), None);
        assert_eq!(to_numeric(None), None);
    }

    #[test]
    fn test_clock_durations() {
        assert_eq!(mins("00:03:00"), Some(3.0));
        assert_eq!(mins("00:30:00"), Some(30.0));
        assert_eq!(mins("02:00:00"), Some(120.0));
        let secs = to_timedelta(Some("0:00:30.5"), DurationUnit::Minutes).map(seconds);
        assert_eq!(secs, Some(30.5));
        assert_eq!(mins("1 days 00:10:00"), Some(1450.0));
        assert_eq!(mins("1 day, 00:00:00"), Some(1440.0));
        assert_eq!(mins("-00:05:00"), Some(-5.0));
    }

    #[test]
    fn test_unit_durations() {
        assert_eq!(mins("45min"), Some(45.0));
        assert_eq!(mins("1h 30m"), Some(90.0));
        assert_eq!(mins("90 s"), Some(1.5));
    }

    #[test]
    fn test_bare_numbers_use_unit() {
        assert_eq!(mins("12"), Some(12.0));
        let secs = to_timedelta(Some("90"), DurationUnit::Seconds).map(seconds);
        assert_eq!(secs, Some(90.0));
    }

    #[test]
    fn test_malformed_durations_are_null() {
        assert_eq!(mins("abc"), None);
        assert_eq!(mins("00:75:00"), None);
        assert_eq!(mins("1:2:3:4"), None);
        assert_eq!(mins("12 parsecs"), None);
        assert_eq!(mins(""), None);
        assert_eq!(mins("9999999999999999:00:00"), None);
        assert_eq!(mins("99999999999999 days 00:00:00"), None);
        assert_eq!(mins("1e300"), None);
        assert_eq!(mins("99999999999999999999h"), None);
    }

    #[test]
    fn test_to_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 6, 27)
            .unwrap()
            .and_hms_opt(10, 15, 32)
            .unwrap();
        assert_eq!(to_datetime(Some("2023-06-27 10:15:32")), Some(expected));
        assert_eq!(to_datetime(Some("2023-06-27T10:15:32Z")), Some(expected));
        assert_eq!(to_datetime(Some("2023-06-27T04:15:32-06:00")), Some(expected));
        assert_eq!(to_datetime(Some("Jun 27, 2023 10:15:32 AM")), Some(expected));
        assert_eq!(to_datetime(Some("27/06/2023 10:15:32")), Some(expected));
        assert_eq!(to_datetime(Some("yesterday")), None);
    }
}
