//! # gridwire
//!
//! Binary wire-protocol core for distributed data-grid clients.
//!
//! This crate implements the packet exchanged between a client and a
//! cluster node: a hand-rolled binary frame with a compact bitmask-driven
//! variable-length header, length-prefixed key/value payloads, a reusable
//! header scratch buffer, and a bounded name-interning cache shared across
//! all packets on a connection.
//!
//! ## Wire Format
//! ```text
//! [HeaderLen(4)] [KeyLen(4)] [ValueLen(4)] [Version(1)]
//! [Header(HeaderLen)] [Key(KeyLen)] [Value(ValueLen)]
//! ```
//!
//! ## Scope
//! Socket I/O, connection pooling, dispatch, and retry are collaborators,
//! not residents: the codec consumes a byte sink/source plus the
//! connection's scratch buffer and name cache, nothing more.
//!
//! ## Example
//! ```rust
//! use gridwire::core::codec::PacketCodec;
//! use gridwire::core::header::HeaderBuffer;
//! use gridwire::core::packet::{ClusterOperation, Packet};
//! use gridwire::utils::name_cache::NameCache;
//! use bytes::Bytes;
//!
//! # fn main() -> gridwire::error::Result<()> {
//! let codec = PacketCodec::new();
//! let mut header = HeaderBuffer::new();
//! let mut names = NameCache::new();
//!
//! let mut packet = Packet::request(
//!     "orders",
//!     ClusterOperation::MapPut,
//!     Some(Bytes::from_static(b"key")),
//!     Some(Bytes::from_static(b"value")),
//! );
//! packet.call_id = 1;
//!
//! let mut wire = Vec::new();
//! codec.encode(&packet, &mut header, &mut names, &mut wire)?;
//!
//! let decoded = codec.decode(&mut header, &mut &wire[..])?;
//! assert_eq!(decoded.call_id, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod transport;
pub mod utils;

pub use crate::core::codec::PacketCodec;
pub use crate::core::header::HeaderBuffer;
pub use crate::core::packet::{ClusterOperation, Index, Packet, ResponseType};
pub use crate::error::{ProtocolError, Result};
pub use crate::transport::framed::PacketFramer;
pub use crate::utils::name_cache::NameCache;
