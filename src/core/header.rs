//! # Header Layout
//!
//! Presence-bitmask flags and the reusable header scratch buffer.
//!
//! Every packet header carries a single bitmask byte describing which
//! optional scalar fields follow it. The flag constants here define that
//! bit layout; the [`HeaderBuffer`] provides the per-connection scratch
//! space used to build and parse headers without per-call allocation.
//!
//! ## Bit Layout
//! ```text
//! bit 0  lock count present
//! bit 1  timeout present
//! bit 2  ttl present
//! bit 3  transaction id present
//! bit 4  long value present
//! bit 5  version present
//! bit 6  originator is a client (always set by this encoder)
//! bit 7  lock address absent (always set by this encoder)
//! ```
//!
//! Bit 7 is an invariant, not an option: a header carrying server-side
//! lock-address data is invalid input for a client decoder and is rejected.

use crate::config::DEFAULT_HEADER_CAPACITY;
use crate::error::constants::ERR_TRUNCATED_HEADER;
use crate::error::{ProtocolError, Result};
use std::io::{self, Read};

/// Lock count follows the bitmask
pub const FLAG_LOCK_COUNT: u8 = 1 << 0;
/// Timeout follows
pub const FLAG_TIMEOUT: u8 = 1 << 1;
/// TTL follows
pub const FLAG_TTL: u8 = 1 << 2;
/// Transaction id follows
pub const FLAG_TXN_ID: u8 = 1 << 3;
/// Long value follows
pub const FLAG_LONG_VALUE: u8 = 1 << 4;
/// Entry version follows
pub const FLAG_VERSION: u8 = 1 << 5;
/// Packet originates from a client
pub const FLAG_CLIENT: u8 = 1 << 6;
/// No lock address in this header (server-only field)
pub const FLAG_LOCK_ADDRESS_ABSENT: u8 = 1 << 7;

/// Reusable scratch buffer for building and parsing packet headers.
///
/// One buffer per connection direction: it is reset at the start of every
/// encode or decode call and must not be shared between a concurrent send
/// and receive. The `&mut` receivers make that a compile-time rule.
///
/// On the write side the codec reserves the 13-byte frame prefix, appends
/// header fields, then patches the prefix once the true header size is
/// known — a single linear pass with no double encoding. On the read side
/// the buffer is filled with exactly the claimed header length and consumed
/// front to back.
#[derive(Debug)]
pub struct HeaderBuffer {
    buf: Vec<u8>,
    read_pos: usize,
}

impl HeaderBuffer {
    /// Create a buffer with the default capacity, sized for a full header
    /// with every optional present and a typical resource name
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HEADER_CAPACITY)
    }

    /// Create a buffer with a specific initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            read_pos: 0,
        }
    }

    /// Reset position and contents, keeping the allocation for reuse
    pub fn reset(&mut self) {
        self.buf.clear();
        self.read_pos = 0;
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// All bytes written so far
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Bytes not yet consumed by the read-side getters
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.read_pos
    }

    // ---- write side ----

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Overwrite already-written bytes at `at`; used to back-fill the frame
    /// prefix after the header body has been built behind it
    pub fn patch(&mut self, at: usize, bytes: &[u8]) {
        debug_assert!(at + bytes.len() <= self.buf.len());
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
    }

    // ---- read side ----

    /// Replace the contents with exactly `n` bytes read from `src`
    pub fn fill_from<R: Read>(&mut self, src: &mut R, n: usize) -> io::Result<()> {
        self.reset();
        self.buf.resize(n, 0);
        src.read_exact(&mut self.buf)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        let b = self.take(1)?;
        Ok(b[0])
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        let b = self.take(8)?;
        Ok(i64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn get_slice(&mut self, n: usize) -> Result<&[u8]> {
        self.take(n)
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(ProtocolError::ProtocolViolation(
                ERR_TRUNCATED_HEADER.to_string(),
            ));
        }
        let start = self.read_pos;
        self.read_pos += n;
        Ok(&self.buf[start..self.read_pos])
    }
}

impl Default for HeaderBuffer {
    fn default() -> Self {
        Self::new()
    }
}
