//! Time Expression Resolver
//!
//! Converts the flexible time values accepted in a query description into
//! absolute epoch seconds:
//!
//! ```text
//! 1594116303000           epoch milliseconds, rounded to seconds
//! "1594116303000"         same, in string form
//! "now"                   current time
//! "-7d", "-2hours"        relative to now
//! "2020-07-07 10:05:03"   calendar time, read as UTC
//! ```
//!
//! Resolution never fails. Missing values resolve to `0`, and anything that
//! cannot be read as a time at all also resolves to `0`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const S_MIN: i64 = 60;
const S_HR: i64 = 60 * S_MIN;
const S_DAY: i64 = 24 * S_HR;
const S_WEEK: i64 = 7 * S_DAY;

/// A time value as supplied by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    /// Epoch milliseconds
    Epoch(i64),
    /// Epoch milliseconds with a fractional part
    Number(f64),
    /// Numeric string, relative expression or calendar time
    Text(String),
}

impl TimeValue {
    /// The value as the caller wrote it, for logging
    pub fn raw(&self) -> String {
        match self {
            Self::Epoch(n) => n.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<i64> for TimeValue {
    fn from(value: i64) -> Self {
        Self::Epoch(value)
    }
}

impl From<i32> for TimeValue {
    fn from(value: i32) -> Self {
        Self::Epoch(value as i64)
    }
}

impl From<f64> for TimeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for TimeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TimeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Resolve a time value against the current clock
pub fn resolve(value: Option<&TimeValue>) -> i64 {
    resolve_at(value, Utc::now())
}

/// Resolve a time value with `now` as the reference for relative expressions
pub fn resolve_at(value: Option<&TimeValue>, now: DateTime<Utc>) -> i64 {
    let Some(value) = value else {
        return 0;
    };

    match value {
        TimeValue::Epoch(n) => epoch_millis(*n as f64),
        TimeValue::Number(n) => epoch_millis(*n),
        TimeValue::Text(s) => resolve_text(s, now),
    }
}

fn resolve_text(s: &str, now: DateTime<Utc>) -> i64 {
    let trimmed = s.trim();

    // Blank and numeric strings are epoch values, like their numeric forms
    if trimmed.is_empty() {
        return 0;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return epoch_millis(n);
    }

    let lower = s.to_lowercase();
    if let Some(secs) = resolve_relative(&lower, now) {
        return secs;
    }

    // Unrecognized units land here as well and usually resolve to 0
    parse_absolute(s).unwrap_or(0)
}

/// Match `now` or `-<count><unit>` anywhere in a lower-cased expression
fn resolve_relative(lower: &str, now: DateTime<Utc>) -> Option<i64> {
    let caps = relative_pattern()?.captures(lower)?;
    let now_secs = millis_to_seconds(now.timestamp_millis());

    if caps.name("now").is_some() {
        return Some(now_secs);
    }

    let unit = unit_seconds(caps.name("unit")?.as_str())?;
    let count: i64 = caps.name("count")?.as_str().parse().ok()?;
    let delta = count.checked_mul(unit)?;
    now_secs.checked_sub(delta)
}

fn relative_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?P<now>now)|-(?P<count>[0-9]+)(?P<unit>[a-z0-9_]+)").ok())
        .as_ref()
}

/// Seconds per unit for every accepted unit spelling
pub fn unit_seconds(unit: &str) -> Option<i64> {
    match unit {
        "minute" | "minutes" | "min" | "mins" | "m" => Some(S_MIN),
        "hour" | "hours" | "hr" | "hrs" | "h" => Some(S_HR),
        "day" | "days" | "d" => Some(S_DAY),
        "week" | "weeks" | "wk" | "wks" | "w" => Some(S_WEEK),
        _ => None,
    }
}

/// Parse a calendar time string as UTC
fn parse_absolute(s: &str) -> Option<i64> {
    let s = s.trim();
    let s = s
        .strip_suffix("UTC")
        .or_else(|| s.strip_suffix("GMT"))
        .map(str::trim_end)
        .unwrap_or(s);

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(millis_to_seconds(dt.timestamp_millis()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(millis_to_seconds(dt.timestamp_millis()));
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(millis_to_seconds(dt.and_utc().timestamp_millis()));
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp());
        }
    }

    None
}

/// Largest representable calendar time, in milliseconds either side of the epoch
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// Epoch milliseconds to seconds
///
/// Fractional milliseconds are truncated, then the result is rounded to the
/// nearest second with halves rounding up. Values outside the calendar range
/// resolve to `0`.
fn epoch_millis(ms: f64) -> i64 {
    if !ms.is_finite() || ms.abs() > MAX_EPOCH_MILLIS {
        return 0;
    }
    millis_to_seconds(ms.trunc() as i64)
}

fn millis_to_seconds(ms: i64) -> i64 {
    ms.saturating_add(500).div_euclid(1000)
}
