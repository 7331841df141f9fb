//! Temporal validation errors.

use thiserror::Error;

/// Result type for temporal construction.
pub type TemporalResult<T> = Result<T, TemporalError>;

/// Errors raised while constructing or converting temporal values.
///
/// Errors split into two classes: type errors (a field is not an integral
/// number, the source timestamp is unusable, the zone discriminant is
/// missing or doubled) and range errors (a field is outside its bounds).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemporalError {
    /// Field is not an integral number
    #[error("{field} is expected to be an integer but was: {found}")]
    InvalidType { field: &'static str, found: String },

    /// Field outside its legal bounds
    #[error("{field} is expected to be in range [{min}, {max}] but was: {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Arithmetic left the representable range
    #[error("{0} overflows the supported range")]
    Overflow(&'static str),

    /// Zone id not present in the IANA database
    #[error("Time zone ID is expected to be a valid ZoneId but was: '{0}'")]
    UnknownZone(String),

    /// DateTime given neither an offset nor a zone id
    #[error("DateTime requires a time zone offset or a time zone id, got neither")]
    MissingZone,

    /// DateTime given both an offset and a zone id
    #[error("DateTime requires exactly one of time zone offset and time zone id, got both")]
    ConflictingZone,

    /// Platform timestamp could not be read
    #[error("Invalid source timestamp: {0}")]
    InvalidSource(String),
}

impl TemporalError {
    /// Type error for a named field.
    pub fn invalid_type(field: &'static str, found: impl Into<String>) -> Self {
        Self::InvalidType {
            field,
            found: found.into(),
        }
    }

    /// Invalid source timestamp error.
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }

    /// True for type-class errors.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidType { .. }
                | Self::InvalidSource(_)
                | Self::MissingZone
                | Self::ConflictingZone
        )
    }

    /// True for range-class errors.
    pub fn is_range_error(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::Overflow(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let err = TemporalError::invalid_type("Year", "\"2020\"");
        assert!(err.is_type_error());
        assert!(!err.is_range_error());

        let err = TemporalError::OutOfRange {
            field: "Month",
            value: 13,
            min: 1,
            max: 12,
        };
        assert!(err.is_range_error());
        assert_eq!(
            err.to_string(),
            "Month is expected to be in range [1, 12] but was: 13"
        );

        let err = TemporalError::UnknownZone("Mars/Olympus".into());
        assert!(err.to_string().contains("Mars/Olympus"));
        assert!(!err.is_type_error() && !err.is_range_error());
    }
}
