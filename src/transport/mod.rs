//! # Transport Adapters
//!
//! Glue between the sans-io codec and byte-stream transports.
//!
//! ## Components
//! - **Framed**: `tokio_util::codec` adapter owning per-connection codec state
//!
//! Actual socket I/O, connection lifecycle, and retry policy live outside
//! this crate.

pub mod framed;

pub use framed::PacketFramer;
