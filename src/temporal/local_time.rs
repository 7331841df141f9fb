//! Wall-clock time without a zone.

use std::fmt;

use serde::Serialize;

use super::clock::StandardDate;
use super::error::TemporalResult;
use super::util::{self, field_in_range, TemporalField, NANOS_PER_DAY};

/// Time of day with nanosecond precision and no time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocalTime {
    hour: u8,
    minute: u8,
    second: u8,
    nanosecond: u32,
}

impl LocalTime {
    /// Create a new local time.
    pub fn new(
        hour: impl TemporalField,
        minute: impl TemporalField,
        second: impl TemporalField,
        nanosecond: impl TemporalField,
    ) -> TemporalResult<Self> {
        Ok(Self {
            hour: field_in_range("Hour", &hour, 0, 23)? as u8,
            minute: field_in_range("Minute", &minute, 0, 59)? as u8,
            second: field_in_range("Second", &second, 0, 59)? as u8,
            nanosecond: field_in_range("Nanosecond", &nanosecond, 0, 999_999_999)? as u32,
        })
    }

    /// Build from nanoseconds since midnight.
    pub fn from_nano_of_day(nano_of_day: i64) -> TemporalResult<Self> {
        let nano_of_day = util::check_range("Nanosecond of day", nano_of_day, 0, NANOS_PER_DAY - 1)?;
        let (hour, minute, second, nanosecond) = util::nano_of_day_to_local_time(nano_of_day);
        Self::new(hour, minute, second, nanosecond)
    }

    /// Read the wall-clock time of a platform timestamp.
    ///
    /// `nanosecond` replaces the source's sub-second fraction when given.
    pub fn from_standard_date(
        source: &dyn StandardDate,
        nanosecond: Option<&dyn TemporalField>,
    ) -> TemporalResult<Self> {
        let clock = source.wall_clock()?.with_nanosecond(nanosecond)?;
        Self::new(clock.hour, clock.minute, clock.second, clock.nanosecond)
    }

    pub fn hour(&self) -> i64 {
        self.hour as i64
    }

    pub fn minute(&self) -> i64 {
        self.minute as i64
    }

    pub fn second(&self) -> i64 {
        self.second as i64
    }

    pub fn nanosecond(&self) -> i64 {
        self.nanosecond as i64
    }

    /// Nanoseconds since midnight.
    pub fn nano_of_day(&self) -> i64 {
        util::local_time_to_nano_of_day(self.hour(), self.minute(), self.second(), self.nanosecond())
    }

    pub(crate) fn second_of_day(&self) -> i64 {
        self.hour() * util::SECONDS_PER_HOUR + self.minute() * util::SECONDS_PER_MINUTE + self.second()
    }

    pub(crate) fn write_iso(&self, out: &mut String) {
        util::write_time(out, self.hour(), self.minute(), self.second(), self.nanosecond());
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(18);
        self.write_iso(&mut out);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(LocalTime::new(23, 59, 59, 999_999_999).is_ok());
        assert!(LocalTime::new(24, 0, 0, 0).unwrap_err().is_range_error());
        assert!(LocalTime::new(0, 60, 0, 0).unwrap_err().is_range_error());
        assert!(LocalTime::new(0, 0, 60, 0).unwrap_err().is_range_error());
        assert!(LocalTime::new(1, 1, 1, 1_000_000_000).unwrap_err().is_range_error());
        assert!(LocalTime::new(-1, 0, 0, 0).unwrap_err().is_range_error());
    }

    #[test]
    fn test_type_errors() {
        assert!(LocalTime::new("12", 0, 0, 0).unwrap_err().is_type_error());
        assert!(LocalTime::new(12, 0, 0, 0.25f64).unwrap_err().is_type_error());
    }

    #[test]
    fn test_to_string() {
        assert_eq!(LocalTime::new(9, 5, 7, 0).unwrap().to_string(), "09:05:07");
        assert_eq!(
            LocalTime::new(23, 59, 59, 1).unwrap().to_string(),
            "23:59:59.000000001"
        );
        assert_eq!(
            LocalTime::new(12, 0, 0, 120_000_000).unwrap().to_string(),
            "12:00:00.120000000"
        );
    }

    #[test]
    fn test_nano_of_day_roundtrip() {
        let t = LocalTime::new(13, 14, 15, 16).unwrap();
        assert_eq!(LocalTime::from_nano_of_day(t.nano_of_day()).unwrap(), t);
        assert!(LocalTime::from_nano_of_day(NANOS_PER_DAY).is_err());
        assert!(LocalTime::from_nano_of_day(-1).is_err());
    }
}
