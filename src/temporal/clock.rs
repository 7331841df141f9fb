//! Conversion from platform clock readings.
//!
//! Each temporal type has a `from_standard_date` constructor that reads the
//! wall-clock fields of anything implementing [`StandardDate`]: a chrono
//! date-time in any zone, a [`SystemTime`] (read in the local zone) or an
//! RFC 3339 string.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime as ChronoDateTime, Datelike, Local, Offset, TimeZone, Timelike, Utc};

use super::error::{TemporalError, TemporalResult};
use super::util::{field_in_range, TemporalField};

/// Wall-clock fields read from a platform timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
    pub nanosecond: i64,
    pub offset_seconds: i64,
}

impl WallClock {
    /// Replace the sub-second fraction when an override is given.
    pub fn with_nanosecond(mut self, nanosecond: Option<&dyn TemporalField>) -> TemporalResult<Self> {
        if let Some(value) = nanosecond {
            self.nanosecond = field_in_range("Nanosecond", value, 0, 999_999_999)?;
        }
        Ok(self)
    }
}

/// A platform timestamp that can be read as wall-clock fields.
pub trait StandardDate {
    fn wall_clock(&self) -> TemporalResult<WallClock>;
}

impl<Tz: TimeZone> StandardDate for ChronoDateTime<Tz> {
    fn wall_clock(&self) -> TemporalResult<WallClock> {
        let local = self.naive_local();
        // chrono encodes a leap second as nanosecond >= 1_000_000_000
        if local.nanosecond() >= 1_000_000_000 {
            return Err(TemporalError::invalid_source(format!(
                "leap second {} cannot be represented",
                local
            )));
        }
        Ok(WallClock {
            year: local.year() as i64,
            month: local.month() as i64,
            day: local.day() as i64,
            hour: local.hour() as i64,
            minute: local.minute() as i64,
            second: local.second() as i64,
            nanosecond: local.nanosecond() as i64,
            offset_seconds: self.offset().fix().local_minus_utc() as i64,
        })
    }
}

impl StandardDate for SystemTime {
    fn wall_clock(&self) -> TemporalResult<WallClock> {
        let (seconds, nanos) = match self.duration_since(UNIX_EPOCH) {
            Ok(after) => (i64::try_from(after.as_secs()).ok(), after.subsec_nanos()),
            Err(err) => {
                let before = err.duration();
                let seconds = i64::try_from(before.as_secs()).ok().map(|s| -s);
                match before.subsec_nanos() {
                    0 => (seconds, 0),
                    n => (seconds.and_then(|s| s.checked_sub(1)), 1_000_000_000 - n),
                }
            }
        };
        let utc = seconds
            .and_then(|s| ChronoDateTime::<Utc>::from_timestamp(s, nanos))
            .ok_or_else(|| TemporalError::invalid_source("system time out of range"))?;
        utc.with_timezone(&Local).wall_clock()
    }
}

impl StandardDate for &str {
    fn wall_clock(&self) -> TemporalResult<WallClock> {
        ChronoDateTime::parse_from_rfc3339(self)
            .map_err(|e| TemporalError::invalid_source(format!("'{}': {}", self, e)))?
            .wall_clock()
    }
}

impl StandardDate for String {
    fn wall_clock(&self) -> TemporalResult<WallClock> {
        StandardDate::wall_clock(&self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{Date, DateTime, LocalDateTime, LocalTime, Time};
    use chrono::FixedOffset;

    fn sample() -> ChronoDateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2021, 11, 3, 17, 8, 9)
            .unwrap()
            + chrono::Duration::milliseconds(456)
    }

    #[test]
    fn test_reads_wall_clock_fields() {
        let source = sample();
        assert_eq!(Date::from_standard_date(&source).unwrap(), Date::new(2021, 11, 3).unwrap());
        assert_eq!(
            LocalTime::from_standard_date(&source, None).unwrap(),
            LocalTime::new(17, 8, 9, 456_000_000).unwrap()
        );
        assert_eq!(
            Time::from_standard_date(&source, None).unwrap(),
            Time::new(17, 8, 9, 456_000_000, 9000).unwrap()
        );
        assert_eq!(
            LocalDateTime::from_standard_date(&source, None).unwrap(),
            LocalDateTime::new(2021, 11, 3, 17, 8, 9, 456_000_000).unwrap()
        );
        let dt = DateTime::from_standard_date(&source, None).unwrap();
        assert_eq!(dt.time_zone_offset_seconds(), Some(9000));
        assert_eq!(dt.time_zone_id(), None);
    }

    #[test]
    fn test_nanosecond_override() {
        let source = sample();
        let t = LocalTime::from_standard_date(&source, Some(&42i64)).unwrap();
        assert_eq!(t.nanosecond(), 42);

        let err = LocalTime::from_standard_date(&source, Some(&"42")).unwrap_err();
        assert!(err.is_type_error());
        let err = LocalTime::from_standard_date(&source, Some(&0.5f64)).unwrap_err();
        assert!(err.is_type_error());
        let err = LocalTime::from_standard_date(&source, Some(&1_000_000_000i64)).unwrap_err();
        assert!(err.is_range_error());
    }

    #[test]
    fn test_text_source() {
        let d = Date::from_standard_date(&"1999-12-31T23:59:59-05:00").unwrap();
        assert_eq!(d.to_string(), "1999-12-31");

        let err = Date::from_standard_date(&"yesterday").unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_system_time_source() {
        let now = SystemTime::now();
        assert!(LocalDateTime::from_standard_date(&now, None).is_ok());

        let before_epoch = UNIX_EPOCH - std::time::Duration::from_millis(1500);
        let utc = Utc.timestamp_opt(-2, 500_000_000).unwrap();
        assert_eq!(
            before_epoch.wall_clock().unwrap(),
            utc.with_timezone(&Local).wall_clock().unwrap()
        );
    }
}
