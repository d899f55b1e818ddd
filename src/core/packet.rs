//! # Packet
//!
//! The packet value type: one framed request or response exchanged between
//! a client and a cluster node.
//!
//! A packet is a transient message object — built just before sending, or
//! freshly allocated per incoming frame, then discarded after dispatch. It
//! owns no connection resources.
//!
//! Optional fields use real `Option`s in memory; the wire format keeps its
//! compact presence-bitmask scheme (see [`crate::core::header`]). Two
//! wire-level ambiguities are preserved deliberately:
//! - an absent key/value and an empty one both encode as length 0, and
//!   decode always yields an empty (not absent) byte sequence
//! - an absent resource name and an empty one both encode as name length 0

use crate::config::MAX_INDEXES;
use crate::error::{ProtocolError, Result};
use bytes::Bytes;

/// Operation requested by a packet, carried as a single header byte.
///
/// A client-facing decoder has a closed operation set; unknown bytes are
/// rejected rather than stored raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ClusterOperation {
    #[default]
    NoOp = 0,
    Response = 1,
    Heartbeat = 2,
    MapPut = 3,
    MapGet = 4,
    MapRemove = 5,
    MapContainsKey = 6,
    MapSize = 7,
    MapLock = 8,
    MapUnlock = 9,
    MapEvict = 10,
    MapAddIndex = 11,
    QueueOffer = 12,
    QueuePoll = 13,
    QueuePeek = 14,
    TransactionBegin = 15,
    TransactionCommit = 16,
    TransactionRollback = 17,
    AddListener = 18,
    RemoveListener = 19,
    Event = 20,
    Destroy = 21,
}

impl ClusterOperation {
    /// Wire byte for this operation
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse an operation from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        use ClusterOperation::*;
        match byte {
            0 => Some(NoOp),
            1 => Some(Response),
            2 => Some(Heartbeat),
            3 => Some(MapPut),
            4 => Some(MapGet),
            5 => Some(MapRemove),
            6 => Some(MapContainsKey),
            7 => Some(MapSize),
            8 => Some(MapLock),
            9 => Some(MapUnlock),
            10 => Some(MapEvict),
            11 => Some(MapAddIndex),
            12 => Some(QueueOffer),
            13 => Some(QueuePoll),
            14 => Some(QueuePeek),
            15 => Some(TransactionBegin),
            16 => Some(TransactionCommit),
            17 => Some(TransactionRollback),
            18 => Some(AddListener),
            19 => Some(RemoveListener),
            20 => Some(Event),
            21 => Some(Destroy),
            _ => None,
        }
    }
}

/// Outcome carried by a response packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ResponseType {
    /// Not a response, or no outcome yet
    #[default]
    None = 2,
    Success = 3,
    Failure = 4,
    /// The operation must be retried against another member
    Redo = 5,
}

impl ResponseType {
    /// Wire byte for this response type
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse a response type from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            2 => Some(ResponseType::None),
            3 => Some(ResponseType::Success),
            4 => Some(ResponseType::Failure),
            5 => Some(ResponseType::Redo),
            _ => None,
        }
    }
}

/// One secondary-index descriptor: an index value plus its type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub value: i64,
    pub kind: u8,
}

/// One unit of request/response data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Target resource (a named map, queue, ...); `None` is valid
    pub name: Option<String>,

    /// Requested action
    pub operation: ClusterOperation,

    /// Key payload; `None` encodes identically to an empty sequence
    pub key: Option<Bytes>,

    /// Value payload; same absent/empty ambiguity as `key`
    pub value: Option<Bytes>,

    /// Partition/block routing hint
    pub block_id: i32,

    /// Originating thread, used for lock reentrancy on the server
    pub thread_id: i32,

    /// Held-lock count; `None` when no lock is involved
    pub lock_count: Option<i32>,

    /// Operation timeout in milliseconds
    pub timeout: Option<i64>,

    /// Entry time-to-live in milliseconds
    pub ttl: Option<i64>,

    /// Enclosing transaction id
    pub txn_id: Option<i64>,

    /// Operation-specific scalar argument
    pub long_value: Option<i64>,

    /// Entry version for optimistic concurrency
    pub version: Option<i64>,

    /// Correlates a request with its response; −1 until assigned
    pub call_id: i64,

    /// Response outcome byte
    pub response_type: ResponseType,

    /// Secondary-index descriptors, at most [`MAX_INDEXES`]
    pub indexes: Vec<Index>,
}

impl Default for Packet {
    fn default() -> Self {
        Self {
            name: None,
            operation: ClusterOperation::default(),
            key: None,
            value: None,
            block_id: 0,
            thread_id: 0,
            lock_count: None,
            timeout: None,
            ttl: None,
            txn_id: None,
            long_value: None,
            version: None,
            call_id: -1,
            response_type: ResponseType::default(),
            indexes: Vec::new(),
        }
    }
}

impl Packet {
    /// Build a request packet for `operation` against `name`
    pub fn request(
        name: impl Into<String>,
        operation: ClusterOperation,
        key: Option<Bytes>,
        value: Option<Bytes>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            operation,
            key,
            value,
            ..Self::default()
        }
    }

    /// Append a secondary-index descriptor, enforcing the 10-index bound
    pub fn add_index(&mut self, value: i64, kind: u8) -> Result<()> {
        if self.indexes.len() >= MAX_INDEXES {
            return Err(ProtocolError::IndexOverflow(self.indexes.len() + 1));
        }
        self.indexes.push(Index { value, kind });
        Ok(())
    }

    /// Key length as encoded on the wire (0 when absent)
    pub fn key_len(&self) -> usize {
        self.key.as_ref().map_or(0, Bytes::len)
    }

    /// Value length as encoded on the wire (0 when absent)
    pub fn value_len(&self) -> usize {
        self.value.as_ref().map_or(0, Bytes::len)
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Packet [call_id = {} name = {:?} operation = {:?}]",
            self.call_id, self.name, self.operation
        )
    }
}
