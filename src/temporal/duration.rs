//! Calendar-relative duration.

use std::fmt;

use serde::Serialize;

use super::error::{TemporalError, TemporalResult};
use super::util::{self, TemporalField, NANOS_PER_SECOND};

/// Amount of time in months, days, seconds and nanoseconds.
///
/// Months and days are kept apart from each other and from the seconds since
/// their length depends on the calendar position the duration is applied to.
/// Seconds and nanoseconds are normalized so that the nanosecond part is
/// always within `[0, 999_999_999]`; the sign lives in the seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Duration {
    months: i64,
    days: i64,
    seconds: i64,
    nanoseconds: i64,
}

impl Duration {
    /// Create a new duration, folding out-of-range nanoseconds into seconds.
    ///
    /// ```
    /// use boltcore::temporal::Duration;
    ///
    /// let d = Duration::new(0, 0, 1, -1_000_000_001).unwrap();
    /// assert_eq!((d.seconds(), d.nanoseconds()), (-1, 999_999_999));
    /// ```
    pub fn new(
        months: impl TemporalField,
        days: impl TemporalField,
        seconds: impl TemporalField,
        nanoseconds: impl TemporalField,
    ) -> TemporalResult<Self> {
        let months = months.to_field("Months")?;
        let days = days.to_field("Days")?;
        let seconds = seconds.to_field("Seconds")?;
        let nanoseconds = nanoseconds.to_field("Nanoseconds")?;

        let extra = nanoseconds.div_euclid(NANOS_PER_SECOND);
        let seconds = seconds
            .checked_add(extra)
            .ok_or(TemporalError::Overflow("Seconds"))?;

        Ok(Self {
            months,
            days,
            seconds,
            nanoseconds: nanoseconds.rem_euclid(NANOS_PER_SECOND),
        })
    }

    pub fn months(&self) -> i64 {
        self.months
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Always within `[0, 999_999_999]`.
    pub fn nanoseconds(&self) -> i64 {
        self.nanoseconds
    }

    /// True when every component is zero.
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.seconds == 0 && self.nanoseconds == 0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(32);
        out.push('P');
        out.push_str(&self.months.to_string());
        out.push_str("M");
        out.push_str(&self.days.to_string());
        out.push_str("DT");
        util::write_duration_seconds(&mut out, self.seconds, self.nanoseconds);
        out.push('S');
        f.write_str(&out)
    }
}
