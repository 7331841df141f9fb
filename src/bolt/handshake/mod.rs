//! Version negotiation.
//!
//! The client opens with the magic preamble and four proposals, each a
//! version or a range of minor versions, best first. The server answers with
//! the 4-byte version it picked, or zero.

mod negotiation;
mod version;

pub use negotiation::{negotiate, Handshake, VersionRange};
pub use version::BoltVersion;

pub use super::error::HandshakeError;

/// Bolt protocol magic number: 0x6060B017
pub const BOLT_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Preamble plus four proposals
pub const HANDSHAKE_SIZE: usize = 20;

/// Server answer
pub const HANDSHAKE_RESPONSE_SIZE: usize = 4;
