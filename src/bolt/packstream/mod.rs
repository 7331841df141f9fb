//! PackStream serialization format.
//!
//! PackStream is the binary serialization format used by the Bolt protocol
//! to encode values for transmission between client and server.
//!
//! # Supported Types
//!
//! - **Null**: Single byte marker
//! - **Boolean**: True/False markers
//! - **Integer**: Variable-length encoding (-2^63 to 2^63-1)
//! - **Float**: 64-bit IEEE 754
//! - **String**: UTF-8 encoded, variable length prefix
//! - **Bytes**: Raw bytes, variable length prefix
//! - **List**: Heterogeneous collections
//! - **Map**: String keys to arbitrary values
//! - **Structure**: Tagged structures
//!
//! Temporal values travel as structures; see [`structures`] for their
//! layouts and the DateTime encoding that depends on the protocol version.

pub mod decoder;
pub mod encoder;
pub mod marker;
pub mod structures;
pub mod types;

pub use decoder::{decode, PackStreamDecoder};
pub use encoder::{encode, PackStreamEncoder};
pub use structures::{StructCodec, TemporalValue};
pub use types::{PackStreamStructure, PackStreamValue};

use std::fmt;

use crate::temporal::TemporalError;

/// PackStream errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PackStreamError {
    /// Unexpected end of input
    UnexpectedEof,
    /// Unknown marker byte
    UnknownMarker(u8),
    /// Invalid UTF-8 in string
    InvalidUtf8(String),
    /// Invalid map key (must be string)
    InvalidMapKey,
    /// Value too large to encode
    ValueTooLarge(&'static str, usize),
    /// Nesting deeper than the decoder accepts
    TooDeep(usize),
    /// Invalid structure format
    InvalidStructure(String),
    /// Structure with the wrong number of fields
    FieldCount {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// Structure tag with no known meaning
    UnknownTag(u8),
    /// Structure fields that do not form a valid temporal value
    Temporal(TemporalError),
}

impl fmt::Display for PackStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStreamError::UnexpectedEof => write!(f, "Unexpected end of PackStream data"),
            PackStreamError::UnknownMarker(m) => write!(f, "Unknown PackStream marker: 0x{:02X}", m),
            PackStreamError::InvalidUtf8(e) => write!(f, "Invalid UTF-8 in string: {}", e),
            PackStreamError::InvalidMapKey => write!(f, "Map keys must be strings"),
            PackStreamError::ValueTooLarge(t, s) => write!(f, "{} too large: {} entries", t, s),
            PackStreamError::TooDeep(max) => write!(f, "Nesting deeper than {} levels", max),
            PackStreamError::InvalidStructure(msg) => write!(f, "Invalid structure: {}", msg),
            PackStreamError::FieldCount {
                name,
                expected,
                actual,
            } => write!(
                f,
                "Invalid {} structure: expected {} fields, got {}",
                name, expected, actual
            ),
            PackStreamError::UnknownTag(tag) => {
                write!(f, "Unknown structure tag: 0x{:02X} ('{}')", tag, *tag as char)
            }
            PackStreamError::Temporal(e) => write!(f, "Invalid temporal structure: {}", e),
        }
    }
}

impl std::error::Error for PackStreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PackStreamError::Temporal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TemporalError> for PackStreamError {
    fn from(e: TemporalError) -> Self {
        PackStreamError::Temporal(e)
    }
}
