//! Request validation predicates
//!
//! The boolean predicates gate requests; the typed parsers hand the decoded
//! values to the engine once a request has passed.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::dates::resolve_local;

/// Naive date-time layouts accepted besides RFC 3339
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A date supplied by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedDate {
    /// An instant with an explicit offset, e.g. `2024-01-01T10:00:00Z`
    Instant(DateTime<FixedOffset>),
    /// A wall-clock time in the generation zone, e.g. `2024-01-01T10:00`
    Local(NaiveDateTime),
    /// A calendar day, e.g. `2024-01-01`
    Day(NaiveDate),
}

impl RequestedDate {
    /// The instant this date denotes in `tz`; bare days mean midnight
    pub fn in_zone<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        match self {
            RequestedDate::Instant(instant) => instant.with_timezone(tz),
            RequestedDate::Local(naive) => resolve_local(tz, naive),
            RequestedDate::Day(day) => resolve_local(tz, &day.and_time(chrono::NaiveTime::MIN)),
        }
    }

    /// The calendar day this date falls on in `tz`
    pub fn calendar_day<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        match self {
            RequestedDate::Day(day) => *day,
            RequestedDate::Local(naive) => naive.date(),
            RequestedDate::Instant(_) => self.in_zone(tz).date_naive(),
        }
    }
}

/// Decode a caller-supplied date string
#[must_use]
pub fn parse_date(input: &str) -> Option<RequestedDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Some(RequestedDate::Instant(instant));
    }
    if let Ok(day) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(RequestedDate::Day(day));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(RequestedDate::Local)
}

/// Whether `input` decodes to a valid calendar timestamp
#[must_use]
pub fn is_valid_date(input: &str) -> bool {
    parse_date(input).is_some()
}

/// Baseline probability of at least one commit on a weekday
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Intensity(f64);

impl Intensity {
    /// Applied when the caller does not supply an intensity
    pub const DEFAULT: Intensity = Intensity(0.5);

    /// Accept `value` if it is finite and within `[0, 1]`
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(Self(value))
    }

    /// Parse a decimal string into an intensity
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        input.trim().parse::<f64>().ok().and_then(Self::new)
    }

    /// The raw probability
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether `input` parses as a number in the closed interval `[0, 1]`
#[must_use]
pub fn is_valid_intensity(input: &str) -> bool {
    Intensity::parse(input).is_some()
}
