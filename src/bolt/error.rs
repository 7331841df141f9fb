//! Bolt protocol error types.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use super::handshake::BoltVersion;
use super::message::FailureMessage;
use super::packstream::PackStreamError;
use crate::temporal::TemporalError;

/// Result type for Bolt operations.
pub type BoltResult<T> = Result<T, BoltError>;

/// Bolt protocol errors.
///
/// Cloneable so a single transport failure can be handed to every observer
/// waiting on the connection.
#[derive(Error, Debug, Clone)]
pub enum BoltError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// Handshake error
    #[error("Handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// PackStream or structure decoding error
    #[error("PackStream error: {0}")]
    PackStream(#[from] PackStreamError),

    /// Chunk framing error
    #[error("Codec error: {0}")]
    Codec(String),

    /// Message too large
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Feature not available on the negotiated protocol version
    #[error("{feature} is not supported by Bolt {version}")]
    Capability {
        feature: &'static str,
        version: BoltVersion,
    },

    /// Protocol error (unexpected or malformed message)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// FAILURE reported by the server
    #[error("Server failure: {code} - {message}")]
    Failure { code: String, message: String },

    /// Request ignored by the server
    #[error("Request ignored by server")]
    Ignored,

    /// Connection closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Result consumed in a way that conflicts with an ongoing stream
    #[error("Streaming misuse: {0}")]
    StreamingMisuse(String),

    /// Value cannot be converted to the requested type
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// Invalid temporal value
    #[error("Temporal error: {0}")]
    Temporal(#[from] TemporalError),
}

impl BoltError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    pub fn streaming_misuse(msg: impl Into<String>) -> Self {
        Self::StreamingMisuse(msg.into())
    }

    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }

    pub fn capability(feature: &'static str, version: BoltVersion) -> Self {
        Self::Capability { feature, version }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure {
            code: code.into(),
            message: message.into(),
        }
    }

    /// True when the connection can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BoltError::Io(_)
                | BoltError::Handshake(_)
                | BoltError::Codec(_)
                | BoltError::MessageTooLarge { .. }
                | BoltError::ConnectionClosed
        )
    }

    /// Server error code, for failures reported by the server.
    pub fn code(&self) -> Option<&str> {
        match self {
            BoltError::Failure { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_capability_error(&self) -> bool {
        matches!(self, BoltError::Capability { .. })
    }
}

impl From<io::Error> for BoltError {
    fn from(err: io::Error) -> Self {
        BoltError::Io(Arc::new(err))
    }
}

impl From<FailureMessage> for BoltError {
    fn from(failure: FailureMessage) -> Self {
        BoltError::Failure {
            code: failure.code,
            message: failure.message,
        }
    }
}

impl From<&FailureMessage> for BoltError {
    fn from(failure: &FailureMessage) -> Self {
        BoltError::failure(failure.code.as_str(), failure.message.as_str())
    }
}

/// Handshake-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Server agreed on no version
    #[error("No compatible protocol version found")]
    NoCompatibleVersion,

    /// Server picked a version that was never proposed
    #[error("Server chose unsupported version 0x{0:08X}")]
    UnsupportedVersion(u32),

    /// An HTTP server answered instead of a Bolt server
    #[error("Server responded HTTP; make sure the address points at the Bolt port")]
    Http,

    /// Invalid handshake data (wrong size, etc.)
    #[error("Invalid handshake data: {0}")]
    InvalidData(String),

    /// Connection closed during handshake
    #[error("Connection closed during handshake")]
    ConnectionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_error_display() {
        assert!(HandshakeError::NoCompatibleVersion
            .to_string()
            .contains("No compatible"));
        assert!(HandshakeError::UnsupportedVersion(0x0000_0909)
            .to_string()
            .contains("0x00000909"));
    }

    #[test]
    fn test_bolt_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let bolt_err: BoltError = io_err.into();
        assert!(matches!(bolt_err, BoltError::Io(_)));
        assert!(bolt_err.is_fatal());
        let cloned = bolt_err.clone();
        assert_eq!(cloned.to_string(), "I/O error: reset");
    }

    #[test]
    fn test_capability_error() {
        let err = BoltError::capability("Database name", BoltVersion::V3);
        assert_eq!(err.to_string(), "Database name is not supported by Bolt 3.0");
        assert!(err.is_capability_error());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_failure_from_message() {
        let failure = FailureMessage::new("Neo.ClientError.Statement.SyntaxError", "bad query");
        let err: BoltError = (&failure).into();
        assert_eq!(err.code(), Some("Neo.ClientError.Statement.SyntaxError"));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("bad query"));
    }
}
