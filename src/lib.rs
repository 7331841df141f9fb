//! # boltcore
//!
//! The protocol core of a Bolt graph-database driver.
//!
//! ## Features
//!
//! - **Temporal values** - Validated date, time and duration types with their canonical text form
//! - **Temporal wire codec** - PackStream structures for every temporal type, legacy and UTC date-time encodings
//! - **Version dispatch** - Bolt 3.0 through 5.4 message building with capability checks
//! - **Result streaming** - Batched PULL with watermark back-pressure and replayable summaries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boltcore::bolt::{AuthToken, TxConfig};
//! use boltcore::driver::{connect, ConnectionConfig, FetchSize};
//! use boltcore::params;
//! use boltcore::temporal::Date;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = tokio::net::TcpStream::connect("localhost:7687").await?;
//!     let config = ConnectionConfig::builder()
//!         .with_auth(AuthToken::basic("neo4j", "password"))
//!         .with_fetch_size(FetchSize::Batch(500))
//!         .build();
//!
//!     let conn = connect(stream, config).await?;
//!     conn.initialize()?.await?;
//!
//!     let result = conn.run(
//!         "RETURN $day AS day",
//!         params! {"day" => Date::new(2024, 2, 29)?},
//!         &TxConfig::new(),
//!     )?;
//!     for record in result.collect().await? {
//!         println!("{}", record);
//!     }
//!     let summary = result.summary()?.await?;
//!     println!("consumed after {:?} ms", summary.result_consumed_after);
//!
//!     conn.goodbye();
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`temporal`] - Temporal value model and text formatting
//! - [`bolt`] - PackStream, messages, handshake, framing and per-version protocol
//! - [`driver`] - Connection runtime and streaming results

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bolt;
pub mod driver;
pub mod temporal;

// Re-exports for convenience
pub use driver::{
    connect, Connection, ConnectionConfig, FetchSize, Record, ResultObserver, ResultStream,
    ResultSummary, Value,
};

pub use bolt::{BoltError, BoltResult, BoltVersion, PackStreamValue};

pub use temporal::{Date, DateTime, Duration, LocalDateTime, LocalTime, Time, TemporalError};
