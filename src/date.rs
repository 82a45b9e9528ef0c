use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};

use crate::error::{Error, Result};

/// A convenience wrapper around `chrono::DateTime<Utc>` for callers working
/// with date-epoch (tag 1) and date-string (tag 0) items (§4.8's epoch-date
/// callback, §4.9's `get_next_date_epoch` family).
///
/// This is a reporting/convenience layer over the core `Item` discriminators
/// `DateEpoch(f64)`/`DateString(&str)`, not a replacement for them: the
/// decoder surfaces those without requiring this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date(DateTime<Utc>);

impl Date {
    /// Wraps an existing `chrono` `DateTime`.
    pub fn from_datetime(date_time: DateTime<Utc>) -> Self {
        Date(date_time)
    }

    /// Builds a `Date` from seconds since (or before) the Unix epoch, the
    /// representation a date-epoch item's content carries.
    pub fn from_timestamp(seconds_since_unix_epoch: f64) -> Result<Self> {
        let whole = seconds_since_unix_epoch.trunc() as i64;
        let nanos = (seconds_since_unix_epoch.fract() * 1_000_000_000.0).round() as u32;
        Utc.timestamp_opt(whole, nanos)
            .single()
            .map(Self::from_datetime)
            .ok_or(Error::DateOverflow)
    }

    /// Parses an ISO-8601 (RFC 3339) date, with or without a time component,
    /// the representation a date-string item's content carries.
    pub fn new_from_string(value: &str) -> Result<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self::from_datetime(dt.with_timezone(&Utc)));
        }
        if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            let dt = NaiveDateTime::new(d, chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap());
            return Ok(Self::from_datetime(DateTime::from_naive_utc_and_offset(dt, Utc)));
        }
        Err(Error::InvalidDateString)
    }

    /// The current date and time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// The underlying `chrono` `DateTime`.
    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Seconds since the Unix epoch, the form `write_date_epoch` (§4.11) and
    /// the epoch-date tag callback (§4.8) both use.
    pub fn timestamp(&self) -> f64 {
        let whole = self.0.timestamp();
        let nanos = self.0.nanosecond();
        whole as f64 + (nanos as f64 / 1_000_000_000.0)
    }
}

impl Default for Date {
    fn default() -> Self {
        Self::now()
    }
}

impl TryFrom<&str> for Date {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new_from_string(value)
    }
}

impl AsRef<Date> for Date {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl core::fmt::Display for Date {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0.to_rfc3339_opts(SecondsFormat::Secs, true).as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trips_through_from_timestamp() {
        let date = Date::from_timestamp(1_509_928_128.0).unwrap();
        assert_eq!(date.timestamp(), 1_509_928_128.0);
    }

    #[test]
    fn parses_full_rfc3339_string() {
        let date = Date::new_from_string("2017-11-05T21:08:48Z").unwrap();
        assert_eq!(date.timestamp(), 1_509_908_928.0);
    }

    #[test]
    fn parses_date_only_string_as_midnight_utc() {
        let date = Date::new_from_string("2017-11-05").unwrap();
        assert_eq!(date.to_string(), "2017-11-05T00:00:00Z");
    }

    #[test]
    fn rejects_garbage_string() {
        assert!(Date::new_from_string("not a date").is_err());
    }
}
