//! Calendar helpers used by the history engine
//!
//! Days are handled as [`NaiveDate`] values and only turned into zoned
//! instants when an event time is picked, so iteration never drifts across
//! daylight-saving transitions.

use chrono::{
    DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Weekday,
};

/// Resolve a wall-clock time in `tz`
///
/// Ambiguous times (clocks turned back) take the earlier instant. Times that
/// fall in a gap (clocks turned forward) move one hour later.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> DateTime<Tz> {
    tz.from_local_datetime(naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(*naive + TimeDelta::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(naive))
}

/// Midnight of the calendar day `timestamp` falls on, in its own zone
pub fn start_of_day<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> DateTime<Tz> {
    let midnight = timestamp.date_naive().and_time(NaiveTime::MIN);
    resolve_local(&timestamp.timezone(), &midnight)
}

/// The date `n` calendar days after `date`, or `None` past the representable range
#[must_use]
pub fn add_days(date: NaiveDate, n: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(n))
}

/// Whether the date is a Saturday or Sunday
pub fn is_weekend(date: &impl Datelike) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// A new instant on `day` at `hour:minute:00` in `tz`
///
/// `day` is taken by value, so the caller's day is never modified.
pub fn at_time<Tz: TimeZone>(tz: &Tz, day: NaiveDate, hour: u32, minute: u32) -> DateTime<Tz> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    resolve_local(tz, &day.and_time(time))
}

/// Number of calendar days in the closed range `start..=end`
#[must_use]
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> u64 {
    u64::try_from((end - start).num_days() + 1).unwrap_or(0)
}
