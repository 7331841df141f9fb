//! Date and time without a zone.

use std::fmt;

use serde::Serialize;

use super::clock::StandardDate;
use super::date::Date;
use super::error::{TemporalError, TemporalResult};
use super::local_time::LocalTime;
use super::util::{self, TemporalField, SECONDS_PER_DAY};

/// Calendar date plus wall-clock time, no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocalDateTime {
    date: Date,
    time: LocalTime,
}

impl LocalDateTime {
    /// Create a new local date-time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: impl TemporalField,
        month: impl TemporalField,
        day: impl TemporalField,
        hour: impl TemporalField,
        minute: impl TemporalField,
        second: impl TemporalField,
        nanosecond: impl TemporalField,
    ) -> TemporalResult<Self> {
        Ok(Self {
            date: Date::new(year, month, day)?,
            time: LocalTime::new(hour, minute, second, nanosecond)?,
        })
    }

    pub fn from_parts(date: Date, time: LocalTime) -> Self {
        Self { date, time }
    }

    /// Build from local epoch seconds and a nanosecond adjustment.
    pub fn from_epoch_second(epoch_second: i64, nanosecond: i64) -> TemporalResult<Self> {
        let (epoch_day, second_of_day) = util::split_epoch_second(epoch_second);
        let date = Date::from_epoch_day(epoch_day)?;
        let nano_of_day = (second_of_day as i128) * (util::NANOS_PER_SECOND as i128) + nanosecond as i128;
        let nano_of_day =
            i64::try_from(nano_of_day).map_err(|_| TemporalError::Overflow("Nanosecond"))?;
        let time = LocalTime::from_nano_of_day(nano_of_day)?;
        Ok(Self { date, time })
    }

    /// Read the wall-clock date and time of a platform timestamp.
    pub fn from_standard_date(
        source: &dyn StandardDate,
        nanosecond: Option<&dyn TemporalField>,
    ) -> TemporalResult<Self> {
        let clock = source.wall_clock()?.with_nanosecond(nanosecond)?;
        Self::new(
            clock.year,
            clock.month,
            clock.day,
            clock.hour,
            clock.minute,
            clock.second,
            clock.nanosecond,
        )
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn time(&self) -> LocalTime {
        self.time
    }

    pub fn year(&self) -> i64 {
        self.date.year()
    }

    pub fn month(&self) -> i64 {
        self.date.month()
    }

    pub fn day(&self) -> i64 {
        self.date.day()
    }

    pub fn hour(&self) -> i64 {
        self.time.hour()
    }

    pub fn minute(&self) -> i64 {
        self.time.minute()
    }

    pub fn second(&self) -> i64 {
        self.time.second()
    }

    pub fn nanosecond(&self) -> i64 {
        self.time.nanosecond()
    }

    /// Seconds since 1970-01-01T00:00:00 on the same wall clock.
    pub fn epoch_second(&self) -> i64 {
        self.date.epoch_day() * SECONDS_PER_DAY + self.time.second_of_day()
    }

    pub(crate) fn write_iso(&self, out: &mut String) {
        self.date.write_iso(out);
        out.push('T');
        self.time.write_iso(out);
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(32);
        self.write_iso(&mut out);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string() {
        let dt = LocalDateTime::new(2019, 3, 11, 8, 15, 1, 0).unwrap();
        assert_eq!(dt.to_string(), "2019-03-11T08:15:01");
        let dt = LocalDateTime::new(-12, 1, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(dt.to_string(), "-000012-01-02T03:04:05.000000006");
    }

    #[test]
    fn test_epoch_second_roundtrip() {
        let dt = LocalDateTime::new(1969, 12, 31, 23, 59, 59, 999_999_999).unwrap();
        assert_eq!(dt.epoch_second(), -1);
        assert_eq!(
            LocalDateTime::from_epoch_second(dt.epoch_second(), dt.nanosecond()).unwrap(),
            dt
        );
    }

    #[test]
    fn test_second_60_rejected() {
        assert!(LocalDateTime::new(2020, 1, 1, 0, 0, 60, 0).unwrap_err().is_range_error());
    }
}
