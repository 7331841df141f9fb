//! Calendar arithmetic, field validation and text helpers shared by the
//! temporal types.
//!
//! All calendar math is proleptic Gregorian and uses floor division so that
//! values before the epoch behave the same as values after it.

use std::fmt::Write as _;

use chrono::{DateTime as ChronoDateTime, LocalResult, Offset, TimeZone as _};
use chrono_tz::Tz;

use super::error::{TemporalError, TemporalResult};

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const SECONDS_PER_MINUTE: i64 = 60;
pub const SECONDS_PER_HOUR: i64 = 3_600;
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const NANOS_PER_DAY: i64 = SECONDS_PER_DAY * NANOS_PER_SECOND;

pub const MIN_YEAR: i64 = -99_999;
pub const MAX_YEAR: i64 = 99_999;
pub const MIN_OFFSET_SECONDS: i64 = -64_800;
pub const MAX_OFFSET_SECONDS: i64 = 64_800;

const DAYS_0000_TO_1970: i64 = 719_528;
const DAYS_PER_400_YEAR_CYCLE: i64 = 146_097;

// ============================================================================
// Field coercion
// ============================================================================

/// A value that can stand in for an integral temporal field.
///
/// Native integers always coerce. Floats coerce only when finite and
/// integral. Anything else is a type error naming the field.
pub trait TemporalField {
    /// Coerce to `i64`, reporting `field` on failure.
    fn to_field(&self, field: &'static str) -> TemporalResult<i64>;
}

macro_rules! integral_field {
    ($($ty:ty),*) => {
        $(
            impl TemporalField for $ty {
                fn to_field(&self, _field: &'static str) -> TemporalResult<i64> {
                    Ok(*self as i64)
                }
            }
        )*
    };
}

integral_field!(i8, i16, i32, i64, u8, u16, u32);

impl TemporalField for u64 {
    fn to_field(&self, field: &'static str) -> TemporalResult<i64> {
        i64::try_from(*self).map_err(|_| TemporalError::Overflow(field))
    }
}

impl TemporalField for f64 {
    fn to_field(&self, field: &'static str) -> TemporalResult<i64> {
        if !self.is_finite() || self.fract() != 0.0 {
            return Err(TemporalError::invalid_type(field, self.to_string()));
        }
        if *self < i64::MIN as f64 || *self >= i64::MAX as f64 {
            return Err(TemporalError::Overflow(field));
        }
        Ok(*self as i64)
    }
}

impl TemporalField for str {
    fn to_field(&self, field: &'static str) -> TemporalResult<i64> {
        Err(TemporalError::invalid_type(field, format!("{:?}", self)))
    }
}

impl TemporalField for String {
    fn to_field(&self, field: &'static str) -> TemporalResult<i64> {
        self.as_str().to_field(field)
    }
}

impl<T: TemporalField + ?Sized> TemporalField for &T {
    fn to_field(&self, field: &'static str) -> TemporalResult<i64> {
        (**self).to_field(field)
    }
}

/// Check `value` is within `[min, max]`.
pub fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> TemporalResult<i64> {
    if value < min || value > max {
        return Err(TemporalError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

/// Coerce then range-check a field.
pub fn field_in_range(
    field: &'static str,
    value: &dyn TemporalField,
    min: i64,
    max: i64,
) -> TemporalResult<i64> {
    check_range(field, value.to_field(field)?, min, max)
}

// ============================================================================
// Calendar math
// ============================================================================

pub fn is_leap_year(year: i64) -> bool {
    year.rem_euclid(4) == 0 && (year.rem_euclid(100) != 0 || year.rem_euclid(400) == 0)
}

pub fn days_in_month(year: i64, month: i64) -> i64 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days since 1970-01-01 for a validated date.
pub fn date_to_epoch_day(year: i64, month: i64, day: i64) -> i64 {
    let mut total = 365 * year;
    if year >= 0 {
        total += (year + 3) / 4 - (year + 99) / 100 + (year + 399) / 400;
    } else {
        total -= year / -4 - year / -100 + year / -400;
    }
    total += (367 * month - 362) / 12;
    total += day - 1;
    if month > 2 {
        total -= 1;
        if !is_leap_year(year) {
            total -= 1;
        }
    }
    total - DAYS_0000_TO_1970
}

/// Inverse of [`date_to_epoch_day`]; returns `(year, month, day)`.
pub fn epoch_day_to_date(epoch_day: i64) -> (i64, i64, i64) {
    // March-based year so the leap day is the last day of the year
    let mut zero_day = epoch_day + DAYS_0000_TO_1970 - 60;
    let mut adjust = 0;
    if zero_day < 0 {
        let adjust_cycles = (zero_day + 1) / DAYS_PER_400_YEAR_CYCLE - 1;
        adjust = adjust_cycles * 400;
        zero_day -= adjust_cycles * DAYS_PER_400_YEAR_CYCLE;
    }

    let mut year = (400 * zero_day + 591) / DAYS_PER_400_YEAR_CYCLE;
    let mut day_of_year = zero_day - (365 * year + year / 4 - year / 100 + year / 400);
    if day_of_year < 0 {
        year -= 1;
        day_of_year = zero_day - (365 * year + year / 4 - year / 100 + year / 400);
    }
    year += adjust;

    let march_month = (day_of_year * 5 + 2) / 153;
    let month = (march_month + 2) % 12 + 1;
    let day = day_of_year - (march_month * 306 + 5) / 10 + 1;
    year += march_month / 10;

    (year, month, day)
}

pub fn local_time_to_nano_of_day(hour: i64, minute: i64, second: i64, nanosecond: i64) -> i64 {
    (hour * SECONDS_PER_HOUR + minute * SECONDS_PER_MINUTE + second) * NANOS_PER_SECOND + nanosecond
}

/// Returns `(hour, minute, second, nanosecond)`.
pub fn nano_of_day_to_local_time(nano_of_day: i64) -> (i64, i64, i64, i64) {
    let seconds = nano_of_day.div_euclid(NANOS_PER_SECOND);
    let nanosecond = nano_of_day.rem_euclid(NANOS_PER_SECOND);
    (
        seconds / SECONDS_PER_HOUR,
        (seconds / SECONDS_PER_MINUTE) % 60,
        seconds % 60,
        nanosecond,
    )
}

/// Split epoch seconds into `(epoch_day, second_of_day)`.
pub fn split_epoch_second(epoch_second: i64) -> (i64, i64) {
    (
        epoch_second.div_euclid(SECONDS_PER_DAY),
        epoch_second.rem_euclid(SECONDS_PER_DAY),
    )
}

// ============================================================================
// Zone resolution
// ============================================================================

/// Offset in effect in `tz` for a wall-clock time given as local epoch seconds.
///
/// Ambiguous times (clocks going back) take the earlier offset. Times inside a
/// gap (clocks going forward) take the offset in effect before the gap.
pub fn zone_offset_for_local(tz: Tz, local_epoch_second: i64) -> TemporalResult<i32> {
    let naive = ChronoDateTime::from_timestamp(local_epoch_second, 0)
        .ok_or(TemporalError::Overflow("Epoch second"))?
        .naive_utc();
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.offset().fix().local_minus_utc()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.offset().fix().local_minus_utc()),
        LocalResult::None => {
            let before = naive - chrono::Duration::days(1);
            Ok(tz.offset_from_utc_datetime(&before).fix().local_minus_utc())
        }
    }
}

/// Move a wall-clock time that falls in a gap of `tz` forward by the gap.
///
/// Times that exist locally come back unchanged.
pub fn skip_zone_gap(tz: Tz, local_epoch_second: i64) -> TemporalResult<i64> {
    let naive = ChronoDateTime::from_timestamp(local_epoch_second, 0)
        .ok_or(TemporalError::Overflow("Epoch second"))?
        .naive_utc();
    if !matches!(tz.from_local_datetime(&naive), LocalResult::None) {
        return Ok(local_epoch_second);
    }
    let utc = local_epoch_second - zone_offset_for_local(tz, local_epoch_second)? as i64;
    Ok(utc + zone_offset_for_utc(tz, utc)? as i64)
}

/// Offset in effect in `tz` at a UTC instant.
pub fn zone_offset_for_utc(tz: Tz, utc_epoch_second: i64) -> TemporalResult<i32> {
    let instant = ChronoDateTime::from_timestamp(utc_epoch_second, 0)
        .ok_or(TemporalError::Overflow("Epoch second"))?
        .naive_utc();
    Ok(tz.offset_from_utc_datetime(&instant).fix().local_minus_utc())
}

// ============================================================================
// Text helpers
// ============================================================================

pub fn write_padded(out: &mut String, value: i64, width: usize) {
    if value < 0 {
        out.push('-');
    }
    let _ = write!(out, "{:0width$}", value.unsigned_abs(), width = width);
}

/// `.fffffffff` when non-zero, nothing otherwise.
pub fn write_nanosecond(out: &mut String, nanosecond: i64) {
    if nanosecond != 0 {
        let _ = write!(out, ".{:09}", nanosecond);
    }
}

pub fn write_year(out: &mut String, year: i64) {
    if year < 0 {
        write_padded(out, year, 6);
    } else if year > 9999 {
        let _ = write!(out, "{}", year);
    } else {
        write_padded(out, year, 4);
    }
}

pub fn write_date(out: &mut String, year: i64, month: i64, day: i64) {
    write_year(out, year);
    out.push('-');
    write_padded(out, month, 2);
    out.push('-');
    write_padded(out, day, 2);
}

pub fn write_time(out: &mut String, hour: i64, minute: i64, second: i64, nanosecond: i64) {
    write_padded(out, hour, 2);
    out.push(':');
    write_padded(out, minute, 2);
    out.push(':');
    write_padded(out, second, 2);
    write_nanosecond(out, nanosecond);
}

/// `Z`, `±HH:MM` or `±HH:MM:SS`.
pub fn write_offset(out: &mut String, offset_seconds: i64) {
    if offset_seconds == 0 {
        out.push('Z');
        return;
    }
    out.push(if offset_seconds < 0 { '-' } else { '+' });
    let offset = offset_seconds.abs();
    write_padded(out, offset / SECONDS_PER_HOUR, 2);
    out.push(':');
    write_padded(out, (offset / SECONDS_PER_MINUTE) % 60, 2);
    let seconds = offset % 60;
    if seconds != 0 {
        out.push(':');
        write_padded(out, seconds, 2);
    }
}

/// Seconds component of a duration from normalized `(seconds, nanoseconds)`.
///
/// A negative second count with a positive nanosecond part borrows one
/// second, so `(-1, 5)` renders as `-0.999999995`.
pub fn write_duration_seconds(out: &mut String, seconds: i64, nanoseconds: i64) {
    let negative = seconds < 0;
    if negative && nanoseconds > 0 {
        if seconds == -1 {
            out.push_str("-0");
        } else {
            let _ = write!(out, "{}", seconds + 1);
        }
    } else {
        let _ = write!(out, "{}", seconds);
    }

    if nanoseconds > 0 {
        let fraction = if negative {
            (2 * NANOS_PER_SECOND - nanoseconds) % NANOS_PER_SECOND
        } else {
            nanoseconds % NANOS_PER_SECOND
        };
        write_nanosecond(out, fraction);
    }
}
