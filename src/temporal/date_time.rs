//! Date and time anchored to an offset or a named zone.

use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::Serialize;

use super::clock::StandardDate;
use super::date::Date;
use super::error::{TemporalError, TemporalResult};
use super::local_date_time::LocalDateTime;
use super::local_time::LocalTime;
use super::util::{self, field_in_range, TemporalField, MAX_OFFSET_SECONDS, MIN_OFFSET_SECONDS};

/// Zone discriminant of a [`DateTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DateTimeZone {
    /// Fixed offset from UTC in seconds
    Offset(i32),
    /// IANA zone; the offset follows the zone rules at the instant
    Id(Tz),
}

impl DateTimeZone {
    /// Validated fixed offset.
    pub fn offset(offset_seconds: impl TemporalField) -> TemporalResult<Self> {
        let offset = field_in_range(
            "Time zone offset in seconds",
            &offset_seconds,
            MIN_OFFSET_SECONDS,
            MAX_OFFSET_SECONDS,
        )?;
        Ok(Self::Offset(offset as i32))
    }

    /// Zone looked up in the IANA database.
    pub fn id(zone_id: &str) -> TemporalResult<Self> {
        Tz::from_str(zone_id)
            .map(Self::Id)
            .map_err(|_| TemporalError::UnknownZone(zone_id.to_string()))
    }

    pub fn zone_id(&self) -> Option<&'static str> {
        match self {
            Self::Id(tz) => Some(tz.name()),
            Self::Offset(_) => None,
        }
    }
}

/// Date and time in a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateTime {
    local: LocalDateTime,
    zone: DateTimeZone,
}

impl DateTime {
    /// Create a date-time with an explicit zone.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: impl TemporalField,
        month: impl TemporalField,
        day: impl TemporalField,
        hour: impl TemporalField,
        minute: impl TemporalField,
        second: impl TemporalField,
        nanosecond: impl TemporalField,
        zone: DateTimeZone,
    ) -> TemporalResult<Self> {
        let local = LocalDateTime::new(year, month, day, hour, minute, second, nanosecond)?;
        Self::from_local(local, zone)
    }

    /// Create from loose zone parts; exactly one of `offset_seconds` and
    /// `zone_id` must be present.
    #[allow(clippy::too_many_arguments)]
    pub fn from_zone_parts(
        year: impl TemporalField,
        month: impl TemporalField,
        day: impl TemporalField,
        hour: impl TemporalField,
        minute: impl TemporalField,
        second: impl TemporalField,
        nanosecond: impl TemporalField,
        offset_seconds: Option<&dyn TemporalField>,
        zone_id: Option<&str>,
    ) -> TemporalResult<Self> {
        let zone = match (offset_seconds, zone_id) {
            (Some(offset), None) => DateTimeZone::offset(offset)?,
            (None, Some(id)) => DateTimeZone::id(id)?,
            (Some(_), Some(_)) => return Err(TemporalError::ConflictingZone),
            (None, None) => return Err(TemporalError::MissingZone),
        };
        Self::new(year, month, day, hour, minute, second, nanosecond, zone)
    }

    /// Wall-clock time in `zone`.
    ///
    /// A time inside a zone's daylight-saving gap is moved forward by the gap,
    /// so 02:30 on a spring-forward night becomes 03:30.
    pub fn from_local(local: LocalDateTime, zone: DateTimeZone) -> TemporalResult<Self> {
        let local = match zone {
            DateTimeZone::Id(tz) => {
                let second = local.epoch_second();
                let shifted = util::skip_zone_gap(tz, second)?;
                if shifted == second {
                    local
                } else {
                    LocalDateTime::from_epoch_second(shifted, local.nanosecond())?
                }
            }
            DateTimeZone::Offset(_) => local,
        };
        Ok(Self { local, zone })
    }

    /// Wall-clock fields and UTC offset of a platform timestamp.
    ///
    /// The result carries a fixed offset, never a zone id.
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
            DateTimeZone::offset(clock.offset_seconds)?,
        )
    }

    /// Build from a UTC instant, resolving the local fields in `zone`.
    pub fn from_utc_epoch_second(
        epoch_second: i64,
        nanosecond: i64,
        zone: DateTimeZone,
    ) -> TemporalResult<Self> {
        let offset = match zone {
            DateTimeZone::Offset(offset) => offset,
            DateTimeZone::Id(tz) => util::zone_offset_for_utc(tz, epoch_second)?,
        };
        let local_second = epoch_second
            .checked_add(offset as i64)
            .ok_or(TemporalError::Overflow("Epoch second"))?;
        Ok(Self {
            local: LocalDateTime::from_epoch_second(local_second, nanosecond)?,
            zone,
        })
    }

    pub fn local(&self) -> LocalDateTime {
        self.local
    }

    pub fn date(&self) -> Date {
        self.local.date()
    }

    pub fn time(&self) -> LocalTime {
        self.local.time()
    }

    pub fn zone(&self) -> DateTimeZone {
        self.zone
    }

    pub fn year(&self) -> i64 {
        self.local.year()
    }

    pub fn month(&self) -> i64 {
        self.local.month()
    }

    pub fn day(&self) -> i64 {
        self.local.day()
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

    /// Fixed offset, if this value was built with one.
    pub fn time_zone_offset_seconds(&self) -> Option<i32> {
        match self.zone {
            DateTimeZone::Offset(offset) => Some(offset),
            DateTimeZone::Id(_) => None,
        }
    }

    pub fn time_zone_id(&self) -> Option<&'static str> {
        self.zone.zone_id()
    }

    /// Offset in effect at this date-time, resolving named zones.
    pub fn effective_offset_seconds(&self) -> TemporalResult<i32> {
        match self.zone {
            DateTimeZone::Offset(offset) => Ok(offset),
            DateTimeZone::Id(tz) => util::zone_offset_for_local(tz, self.local.epoch_second()),
        }
    }

    /// Seconds since the epoch in UTC.
    pub fn utc_epoch_second(&self) -> TemporalResult<i64> {
        Ok(self.local.epoch_second() - self.effective_offset_seconds()? as i64)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(48);
        self.local.write_iso(&mut out);
        match self.zone {
            DateTimeZone::Offset(offset) => util::write_offset(&mut out, offset as i64),
            DateTimeZone::Id(tz) => {
                out.push('[');
                out.push_str(tz.name());
                out.push(']');
            }
        }
        f.write_str(&out)
    }
}
