//! Time of day with a fixed UTC offset.

use std::fmt;

use serde::Serialize;

use super::clock::StandardDate;
use super::error::TemporalResult;
use super::local_time::LocalTime;
use super::util::{self, field_in_range, TemporalField, MAX_OFFSET_SECONDS, MIN_OFFSET_SECONDS};

/// Time of day anchored to a UTC offset given in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Time {
    local: LocalTime,
    offset_seconds: i32,
}

impl Time {
    /// Create a new time.
    pub fn new(
        hour: impl TemporalField,
        minute: impl TemporalField,
        second: impl TemporalField,
        nanosecond: impl TemporalField,
        offset_seconds: impl TemporalField,
    ) -> TemporalResult<Self> {
        let local = LocalTime::new(hour, minute, second, nanosecond)?;
        Self::from_local(local, offset_seconds)
    }

    /// Attach an offset to a local time.
    pub fn from_local(local: LocalTime, offset_seconds: impl TemporalField) -> TemporalResult<Self> {
        let offset = field_in_range(
            "Time zone offset in seconds",
            &offset_seconds,
            MIN_OFFSET_SECONDS,
            MAX_OFFSET_SECONDS,
        )?;
        Ok(Self {
            local,
            offset_seconds: offset as i32,
        })
    }

    /// Read the wall-clock time and offset of a platform timestamp.
    pub fn from_standard_date(
        source: &dyn StandardDate,
        nanosecond: Option<&dyn TemporalField>,
    ) -> TemporalResult<Self> {
        let clock = source.wall_clock()?.with_nanosecond(nanosecond)?;
        Self::new(
            clock.hour,
            clock.minute,
            clock.second,
            clock.nanosecond,
            clock.offset_seconds,
        )
    }

    pub fn hour(&self) -> i64 {
        self.local.hour()
    }

    pub fn minute(&self) -> i64 {
        self.local.minute()
    }

    pub fn second(&self) -> i64 {
        self.local.second()
    }

    pub fn nanosecond(&self) -> i64 {
        self.local.nanosecond()
    }

    pub fn offset_seconds(&self) -> i32 {
        self.offset_seconds
    }

    /// The time without its offset.
    pub fn local_time(&self) -> LocalTime {
        self.local
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(27);
        self.local.write_iso(&mut out);
        util::write_offset(&mut out, self.offset_seconds as i64);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string() {
        let t = Time::new(11, 45, 22, 333_222_111, 9015).unwrap();
        assert_eq!(t.to_string(), "11:45:22.333222111+02:30:15");

        assert_eq!(Time::new(0, 0, 0, 0, 0).unwrap().to_string(), "00:00:00Z");
        assert_eq!(
            Time::new(8, 30, 0, 0, -4 * 3600).unwrap().to_string(),
            "08:30:00-04:00"
        );
    }

    #[test]
    fn test_bounds() {
        assert!(Time::new(1, 1, 1, 1_000_000_000, 0).unwrap_err().is_range_error());
        assert!(Time::new(1, 1, 1, 1, 64_801).unwrap_err().is_range_error());
        assert!(Time::new(1, 1, 1, 1, -64_801).unwrap_err().is_range_error());
        assert!(Time::new(1, 1, 1, 1, 64_800).is_ok());
        assert!(Time::new(1, 1, 1, 1, "+01:00").unwrap_err().is_type_error());
    }
}
