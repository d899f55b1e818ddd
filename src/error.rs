//! # Error Types
//!
//! Error handling for the packet codec.
//!
//! This module defines all error variants that can occur while encoding or
//! decoding packets, from low-level I/O failures to protocol violations.
//!
//! ## Error Categories
//! - **I/O Errors**: failures on the byte sink/source supplied by the caller
//! - **Version Errors**: the decoded packet version differs from the codec's
//! - **Protocol Errors**: invariant violations in an incoming header
//! - **Size Errors**: length claims that exceed configured limits
//! - **Configuration Errors**: invalid or unparseable configuration
//!
//! Both `VersionMismatch` and `ProtocolViolation` are fatal to the decode
//! attempt *and* to the connection: once either fires, the stream position
//! can no longer be trusted, so the connection layer must tear down rather
//! than retry. Retry policy lives outside this crate.
//!
//! All errors implement `std::error::Error` for interoperability.

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
/// Static strings are borrowed, avoiding heap allocations for common error cases.
pub mod constants {
    /// Header parsing errors
    pub const ERR_TRUNCATED_HEADER: &str = "Header shorter than its declared fields";
    pub const ERR_NEGATIVE_LENGTH: &str = "Negative length field in frame prefix";
    pub const ERR_NEGATIVE_NAME_LENGTH: &str = "Negative resource-name length";
    pub const ERR_NAME_NOT_UTF8: &str = "Resource name is not valid UTF-8";

    /// Protocol invariant errors
    pub const ERR_LOCK_ADDRESS_PRESENT: &str = "Lock address must not be sent to a client";
    pub const ERR_UNKNOWN_OPERATION: &str = "Unknown operation code";
    pub const ERR_UNKNOWN_RESPONSE_TYPE: &str = "Unknown response type";
    pub const ERR_INDEX_COUNT: &str = "Index count exceeds the protocol maximum";
}

// ProtocolError is the primary error type for all codec operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Packet version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u8, found: u8 },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Header too large: {0} bytes")]
    OversizedHeader(usize),

    #[error("Payload too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Too many indexes: {0}")]
    IndexOverflow(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
