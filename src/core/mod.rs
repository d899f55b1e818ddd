//! # Core Protocol Components
//!
//! Low-level packet handling, header layout, and the wire codec.
//!
//! This module is the foundation of the crate: the packet value type, the
//! presence-bitmask header with its reusable scratch buffer, and the
//! encode/decode operations.
//!
//! ## Components
//! - **Packet**: the request/response value type with optional-typed fields
//! - **Header**: presence-flag constants and the scratch buffer
//! - **Codec**: encode/decode over caller-supplied byte sinks/sources
//!
//! ## Wire Format
//! ```text
//! [HeaderLen(4)] [KeyLen(4)] [ValueLen(4)] [Version(1)] [Header(N)] [Key] [Value]
//! ```
//!
//! ## Security
//! - Length claims validated before allocation
//! - Version mismatch and invariant violations fail fast and are fatal to
//!   the connection

pub mod codec;
pub mod header;
pub mod packet;
