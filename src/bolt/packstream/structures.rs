//! Temporal structures on the wire.
//!
//! | Type | Tag | Fields |
//! |------|-----|--------|
//! | Duration | `E` | months, days, seconds, nanoseconds |
//! | LocalTime | `t` | nanoOfDay |
//! | Time | `T` | nanoOfDay, offsetSeconds |
//! | Date | `D` | epochDay |
//! | LocalDateTime | `d` | epochSecond, nano |
//! | DateTime (offset) | `I` / `F` | epochSecond, nano, offsetSeconds |
//! | DateTime (zone id) | `i` / `f` | epochSecond, nano, zoneId |
//!
//! DateTime has two encodings. Connections that negotiated UTC date-times
//! (Bolt 5.0+) use `I`/`i` with seconds counted in UTC. Older connections
//! use `F`/`f` with seconds counted on the local wall clock. A
//! [`StructCodec`] is fixed to one encoding and treats the other pair of
//! tags as unknown.

use super::marker::tag;
use super::types::{PackStreamStructure, PackStreamValue};
use super::PackStreamError;
use crate::temporal::{
    Date, DateTime, DateTimeZone, Duration, LocalDateTime, LocalTime, TemporalError, Time,
};

const MAX_NANOSECOND: i64 = 999_999_999;

/// A temporal value decoded from (or bound for) a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalValue {
    Duration(Duration),
    LocalTime(LocalTime),
    Time(Time),
    Date(Date),
    LocalDateTime(LocalDateTime),
    DateTime(DateTime),
}

/// Temporal structure codec for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructCodec {
    utc_date_times: bool,
}

impl StructCodec {
    /// Local wall-clock seconds for DateTime (`F`/`f`).
    pub const LEGACY: StructCodec = StructCodec {
        utc_date_times: false,
    };
    /// UTC seconds for DateTime (`I`/`i`).
    pub const UTC: StructCodec = StructCodec {
        utc_date_times: true,
    };

    pub fn new(utc_date_times: bool) -> Self {
        Self { utc_date_times }
    }

    pub fn utc_date_times(&self) -> bool {
        self.utc_date_times
    }

    /// True when `tag` is one this codec decodes.
    pub fn is_temporal_tag(&self, t: u8) -> bool {
        match t {
            tag::DURATION | tag::LOCAL_TIME | tag::TIME | tag::DATE | tag::LOCAL_DATE_TIME => true,
            tag::DATE_TIME_OFFSET | tag::DATE_TIME_ZONE_ID => self.utc_date_times,
            tag::LEGACY_DATE_TIME_OFFSET | tag::LEGACY_DATE_TIME_ZONE_ID => !self.utc_date_times,
            _ => false,
        }
    }

    // ========================================================================
    // Dehydration
    // ========================================================================

    pub fn encode(&self, value: &TemporalValue) -> Result<PackStreamStructure, PackStreamError> {
        let structure = match value {
            TemporalValue::Duration(d) => PackStreamStructure::new(
                tag::DURATION,
                vec![
                    d.months().into(),
                    d.days().into(),
                    d.seconds().into(),
                    d.nanoseconds().into(),
                ],
            ),
            TemporalValue::LocalTime(t) => {
                PackStreamStructure::new(tag::LOCAL_TIME, vec![t.nano_of_day().into()])
            }
            TemporalValue::Time(t) => PackStreamStructure::new(
                tag::TIME,
                vec![
                    t.local_time().nano_of_day().into(),
                    (t.offset_seconds() as i64).into(),
                ],
            ),
            TemporalValue::Date(d) => PackStreamStructure::new(tag::DATE, vec![d.epoch_day().into()]),
            TemporalValue::LocalDateTime(dt) => PackStreamStructure::new(
                tag::LOCAL_DATE_TIME,
                vec![dt.epoch_second().into(), dt.nanosecond().into()],
            ),
            TemporalValue::DateTime(dt) => self.encode_date_time(dt)?,
        };
        Ok(structure)
    }

    fn encode_date_time(&self, dt: &DateTime) -> Result<PackStreamStructure, PackStreamError> {
        let seconds = if self.utc_date_times {
            dt.utc_epoch_second()?
        } else {
            dt.local().epoch_second()
        };
        let nanos = PackStreamValue::Integer(dt.nanosecond());
        let (t, zone): (u8, PackStreamValue) = match (dt.zone(), self.utc_date_times) {
            (DateTimeZone::Offset(offset), true) => (tag::DATE_TIME_OFFSET, (offset as i64).into()),
            (DateTimeZone::Offset(offset), false) => {
                (tag::LEGACY_DATE_TIME_OFFSET, (offset as i64).into())
            }
            (DateTimeZone::Id(tz), true) => (tag::DATE_TIME_ZONE_ID, tz.name().into()),
            (DateTimeZone::Id(tz), false) => (tag::LEGACY_DATE_TIME_ZONE_ID, tz.name().into()),
        };
        Ok(PackStreamStructure::new(t, vec![seconds.into(), nanos, zone]))
    }

    // ========================================================================
    // Hydration
    // ========================================================================

    /// Decode a temporal structure; any other tag is an error naming it.
    pub fn decode(&self, s: &PackStreamStructure) -> Result<TemporalValue, PackStreamError> {
        if !self.is_temporal_tag(s.tag) {
            return Err(PackStreamError::UnknownTag(s.tag));
        }
        let value = match s.tag {
            tag::DURATION => {
                s.expect_fields("Duration", 4)?;
                TemporalValue::Duration(Duration::new(
                    s.int_field("Duration", 0)?,
                    s.int_field("Duration", 1)?,
                    s.int_field("Duration", 2)?,
                    s.int_field("Duration", 3)?,
                )?)
            }
            tag::LOCAL_TIME => {
                s.expect_fields("LocalTime", 1)?;
                TemporalValue::LocalTime(LocalTime::from_nano_of_day(s.int_field("LocalTime", 0)?)?)
            }
            tag::TIME => {
                s.expect_fields("Time", 2)?;
                let local = LocalTime::from_nano_of_day(s.int_field("Time", 0)?)?;
                TemporalValue::Time(Time::from_local(local, s.int_field("Time", 1)?)?)
            }
            tag::DATE => {
                s.expect_fields("Date", 1)?;
                TemporalValue::Date(Date::from_epoch_day(s.int_field("Date", 0)?)?)
            }
            tag::LOCAL_DATE_TIME => {
                s.expect_fields("LocalDateTime", 2)?;
                let nanos = nanosecond_field(s, "LocalDateTime")?;
                TemporalValue::LocalDateTime(LocalDateTime::from_epoch_second(
                    s.int_field("LocalDateTime", 0)?,
                    nanos,
                )?)
            }
            _ => TemporalValue::DateTime(self.decode_date_time(s)?),
        };
        Ok(value)
    }

    fn decode_date_time(&self, s: &PackStreamStructure) -> Result<DateTime, PackStreamError> {
        s.expect_fields("DateTime", 3)?;
        let seconds = s.int_field("DateTime", 0)?;
        let nanos = nanosecond_field(s, "DateTime")?;
        let zone = match s.tag {
            tag::DATE_TIME_OFFSET | tag::LEGACY_DATE_TIME_OFFSET => {
                DateTimeZone::offset(s.int_field("DateTime", 2)?)?
            }
            _ => DateTimeZone::id(s.str_field("DateTime", 2)?)?,
        };
        if self.utc_date_times {
            Ok(DateTime::from_utc_epoch_second(seconds, nanos, zone)?)
        } else {
            let local = LocalDateTime::from_epoch_second(seconds, nanos)?;
            Ok(DateTime::from_local(local, zone)?)
        }
    }
}

/// Field 1 of the date-time layouts, range checked.
fn nanosecond_field(s: &PackStreamStructure, name: &str) -> Result<i64, PackStreamError> {
    let nanos = s.int_field(name, 1)?;
    if !(0..=MAX_NANOSECOND).contains(&nanos) {
        return Err(TemporalError::OutOfRange {
            field: "Nanosecond",
            value: nanos,
            min: 0,
            max: MAX_NANOSECOND,
        }
        .into());
    }
    Ok(nanos)
}

impl From<Duration> for TemporalValue {
    fn from(v: Duration) -> Self {
        TemporalValue::Duration(v)
    }
}

impl From<LocalTime> for TemporalValue {
    fn from(v: LocalTime) -> Self {
        TemporalValue::LocalTime(v)
    }
}

impl From<Time> for TemporalValue {
    fn from(v: Time) -> Self {
        TemporalValue::Time(v)
    }
}

impl From<Date> for TemporalValue {
    fn from(v: Date) -> Self {
        TemporalValue::Date(v)
    }
}

impl From<LocalDateTime> for TemporalValue {
    fn from(v: LocalDateTime) -> Self {
        TemporalValue::LocalDateTime(v)
    }
}

impl From<DateTime> for TemporalValue {
    fn from(v: DateTime) -> Self {
        TemporalValue::DateTime(v)
    }
}
