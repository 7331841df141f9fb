//! # Temporal values
//!
//! Immutable date, time and duration types exchanged with the server.
//!
//! | Type | Fields |
//! |------|--------|
//! | [`Duration`] | months, days, seconds, nanoseconds |
//! | [`LocalTime`] | hour, minute, second, nanosecond |
//! | [`Time`] | local time + UTC offset seconds |
//! | [`Date`] | year, month, day |
//! | [`LocalDateTime`] | date + local time |
//! | [`DateTime`] | date + local time + [`DateTimeZone`] |
//!
//! Every constructor validates its fields: non-integral inputs are type
//! errors, out-of-bounds inputs are range errors (see [`TemporalError`]).
//! `Display` renders the canonical ISO-8601-like text form.
//!
//! ```
//! use boltcore::temporal::{Date, Time};
//!
//! assert_eq!(Date::new(-999, 12, 24).unwrap().to_string(), "-000999-12-24");
//! assert_eq!(
//!     Time::new(11, 45, 22, 333_222_111, 9015).unwrap().to_string(),
//!     "11:45:22.333222111+02:30:15"
//! );
//! ```

pub mod clock;
mod date;
mod date_time;
mod duration;
pub mod error;
mod local_date_time;
mod local_time;
mod time;
pub(crate) mod util;

pub use clock::{StandardDate, WallClock};
pub use date::Date;
pub use date_time::{DateTime, DateTimeZone};
pub use duration::Duration;
pub use error::{TemporalError, TemporalResult};
pub use local_date_time::LocalDateTime;
pub use local_time::LocalTime;
pub use time::Time;
pub use util::TemporalField;
