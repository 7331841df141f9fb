//! # Bolt Protocol Implementation
//!
//! Wire-level pieces of the Bolt protocol, independent of any connection:
//!
//! - **PackStream** - Binary serialization format, including temporal structures
//! - **Message Types** - Request/response messages and summary metadata
//! - **Handshake** - Protocol version negotiation
//! - **Codec** - Chunked message framing for Tokio
//! - **Protocol** - Per-version message building and capability checks
//!
//! ## Protocol Versions
//!
//! Bolt 3.0, 4.0 through 4.4 and 5.0 through 5.4 are supported. See
//! [`protocol`] for what changes between them.
//!
//! ## Note
//!
//! The connection runtime that drives these messages lives in
//! [`crate::driver`].

pub mod codec;
pub mod error;
pub mod handshake;
pub mod message;
pub mod packstream;
pub mod protocol;

pub use codec::{BoltCodec, BoltRequestCodec, BoltResponseCodec};
pub use error::{BoltError, BoltResult, HandshakeError};
pub use handshake::{BoltVersion, Handshake, BOLT_MAGIC};
pub use message::{
    AccessMode, AuthToken, BoltAgent, BoltRequest, BoltResponse, FailureMessage,
    NotificationFilter, QueryStats, RecordMessage, RoutingTable, SuccessMessage, TxConfig,
};
pub use packstream::{
    PackStreamError, PackStreamStructure, PackStreamValue, StructCodec, TemporalValue,
};
pub use protocol::{Feature, HelloParams, Protocol, RouteParams};
