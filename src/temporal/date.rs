//! Calendar date.

use std::fmt;

use serde::Serialize;

use super::clock::StandardDate;
use super::error::TemporalResult;
use super::util::{self, check_range, field_in_range, TemporalField, MAX_YEAR, MIN_YEAR};

/// Proleptic Gregorian date between years -99999 and 99999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Date {
    year: i32,
    month: u8,
    day: u8,
}

impl Date {
    /// Create a new date, checking the day against the month length.
    pub fn new(
        year: impl TemporalField,
        month: impl TemporalField,
        day: impl TemporalField,
    ) -> TemporalResult<Self> {
        let year = field_in_range("Year", &year, MIN_YEAR, MAX_YEAR)?;
        let month = field_in_range("Month", &month, 1, 12)?;
        let day = day.to_field("Day")?;
        check_range("Day", day, 1, util::days_in_month(year, month))?;
        Ok(Self {
            year: year as i32,
            month: month as u8,
            day: day as u8,
        })
    }

    /// Build from days since 1970-01-01.
    pub fn from_epoch_day(epoch_day: i64) -> TemporalResult<Self> {
        let min = util::date_to_epoch_day(MIN_YEAR, 1, 1);
        let max = util::date_to_epoch_day(MAX_YEAR, 12, 31);
        check_range("Epoch day", epoch_day, min, max)?;
        let (year, month, day) = util::epoch_day_to_date(epoch_day);
        Self::new(year, month, day)
    }

    /// Read the wall-clock date of a platform timestamp.
    pub fn from_standard_date(source: &dyn StandardDate) -> TemporalResult<Self> {
        let clock = source.wall_clock()?;
        Self::new(clock.year, clock.month, clock.day)
    }

    pub fn year(&self) -> i64 {
        self.year as i64
    }

    pub fn month(&self) -> i64 {
        self.month as i64
    }

    pub fn day(&self) -> i64 {
        self.day as i64
    }

    /// Days since 1970-01-01.
    pub fn epoch_day(&self) -> i64 {
        util::date_to_epoch_day(self.year(), self.month(), self.day())
    }

    pub(crate) fn write_iso(&self, out: &mut String) {
        util::write_date(out, self.year(), self.month(), self.day());
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(13);
        self.write_iso(&mut out);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string() {
        assert_eq!(Date::new(-999, 12, 24).unwrap().to_string(), "-000999-12-24");
        assert_eq!(Date::new(2024, 2, 29).unwrap().to_string(), "2024-02-29");
        assert_eq!(Date::new(7, 1, 1).unwrap().to_string(), "0007-01-01");
        assert_eq!(Date::new(10_000, 1, 1).unwrap().to_string(), "10000-01-01");
        assert_eq!(Date::new(-99_999, 1, 1).unwrap().to_string(), "-099999-01-01");
    }

    #[test]
    fn test_bounds() {
        assert!(Date::new(1, 0, 1).unwrap_err().is_range_error());
        assert!(Date::new(1, 13, 1).unwrap_err().is_range_error());
        assert!(Date::new(1, 1, 0).unwrap_err().is_range_error());
        assert!(Date::new(2023, 2, 29).unwrap_err().is_range_error());
        assert!(Date::new(1900, 2, 29).unwrap_err().is_range_error());
        assert!(Date::new(2000, 2, 29).is_ok());
        assert!(Date::new(2023, 4, 31).unwrap_err().is_range_error());
        assert!(Date::new(100_000, 1, 1).unwrap_err().is_range_error());
        assert!(Date::new(-100_000, 1, 1).unwrap_err().is_range_error());
    }

    #[test]
    fn test_type_errors() {
        assert!(Date::new("2020", 1, 1).unwrap_err().is_type_error());
        assert!(Date::new(2020, f64::INFINITY, 1).unwrap_err().is_type_error());
        assert!(Date::new(2020, 1, 1.5f64).unwrap_err().is_type_error());
    }

    #[test]
    fn test_epoch_day() {
        let d = Date::new(1970, 1, 1).unwrap();
        assert_eq!(d.epoch_day(), 0);
        let d = Date::new(-999, 12, 24).unwrap();
        assert_eq!(Date::from_epoch_day(d.epoch_day()).unwrap(), d);
        assert!(Date::from_epoch_day(i64::MAX).unwrap_err().is_range_error());
    }
}
