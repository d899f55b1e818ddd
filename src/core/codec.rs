//! # Packet Codec
//!
//! Encode and decode for the packet wire format.
//!
//! ## Wire Format
//! ```text
//! [HeaderLen(4)] [KeyLen(4)] [ValueLen(4)] [Version(1)]
//! [Header(HeaderLen)] [Key(KeyLen)] [Value(ValueLen)]
//! ```
//! All multi-byte integers are big-endian. The header itself is
//! variable-length: a presence bitmask byte selects which optional scalars
//! appear (see [`crate::core::header`] for the bit layout).
//!
//! The codec is stateless logic over borrowed collaborators: a
//! [`HeaderBuffer`] scratch buffer and a [`NameCache`], both owned by the
//! connection, plus the caller's byte sink/source. Nothing here blocks on
//! its own; any blocking belongs to the supplied `Read`/`Write`.
//!
//! ## Security
//! - Header and payload length claims are validated before allocation
//! - A version mismatch fails the decode immediately; stream alignment is
//!   untrusted afterwards, so the connection must be torn down
//! - A header carrying server-only lock-address data (bit 7 clear) is
//!   rejected as a protocol violation

use crate::config::{
    ProtocolConfig, FRAME_PREFIX_LEN, MAX_HEADER_SIZE, MAX_INDEXES, MAX_PAYLOAD_SIZE,
    PACKET_VERSION,
};
use crate::core::header::{
    HeaderBuffer, FLAG_CLIENT, FLAG_LOCK_ADDRESS_ABSENT, FLAG_LOCK_COUNT, FLAG_LONG_VALUE,
    FLAG_TIMEOUT, FLAG_TTL, FLAG_TXN_ID, FLAG_VERSION,
};
use crate::core::packet::{ClusterOperation, Index, Packet, ResponseType};
use crate::error::constants::{
    ERR_INDEX_COUNT, ERR_LOCK_ADDRESS_PRESENT, ERR_NAME_NOT_UTF8, ERR_NEGATIVE_LENGTH,
    ERR_NEGATIVE_NAME_LENGTH, ERR_UNKNOWN_OPERATION, ERR_UNKNOWN_RESPONSE_TYPE,
};
use crate::error::{ProtocolError, Result};
use crate::utils::name_cache::NameCache;
use bytes::Bytes;
use std::io::{Read, Write};
use tracing::{trace, warn};

/// Encoder/decoder for one packet wire-format version.
///
/// The version byte is injected at construction rather than read from
/// global state, so peers speaking different versions are testable side
/// by side.
#[derive(Debug, Clone)]
pub struct PacketCodec {
    version: u8,
    max_header_size: usize,
    max_payload_size: usize,
}

impl PacketCodec {
    /// Codec for the current protocol version with default limits
    pub fn new() -> Self {
        Self {
            version: PACKET_VERSION,
            max_header_size: MAX_HEADER_SIZE,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }

    /// Codec for a specific wire-format version
    pub fn with_version(version: u8) -> Self {
        Self {
            version,
            ..Self::new()
        }
    }

    /// Codec configured from a [`ProtocolConfig`]
    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self {
            version: config.packet_version,
            max_header_size: config.max_header_size,
            max_payload_size: config.max_payload_size,
        }
    }

    /// Wire-format version this codec speaks
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Upper bound accepted for an incoming header-length claim
    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    /// Upper bound accepted for an incoming key or value length claim
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Encode `packet` onto `sink`.
    ///
    /// The header is built into `header` starting behind the 13-byte frame
    /// prefix; once its true size is known the prefix is patched in and the
    /// whole buffer is written in one pass, followed by the raw key and
    /// value bytes. `names` provides the interned resource-name bytes.
    ///
    /// Fails only on sink I/O errors, on a packet carrying more than
    /// [`MAX_INDEXES`] indexes, or on a key/value larger than the codec's
    /// payload limit — a frame whose length prefix cannot hold the payload
    /// would be rejected by every decoder anyway. All guards run before any
    /// byte is written.
    pub fn encode<W: Write>(
        &self,
        packet: &Packet,
        header: &mut HeaderBuffer,
        names: &mut NameCache,
        sink: &mut W,
    ) -> Result<()> {
        if packet.indexes.len() > MAX_INDEXES {
            return Err(ProtocolError::IndexOverflow(packet.indexes.len()));
        }
        if packet.key_len() > self.max_payload_size {
            return Err(ProtocolError::OversizedPacket(packet.key_len()));
        }
        if packet.value_len() > self.max_payload_size {
            return Err(ProtocolError::OversizedPacket(packet.value_len()));
        }

        header.reset();
        header.put_slice(&[0u8; FRAME_PREFIX_LEN]);
        write_header(packet, header, names);

        let header_len = header.len() - FRAME_PREFIX_LEN;
        header.patch(0, &(header_len as i32).to_be_bytes());
        header.patch(4, &(packet.key_len() as i32).to_be_bytes());
        header.patch(8, &(packet.value_len() as i32).to_be_bytes());
        header.patch(12, &[self.version]);

        sink.write_all(header.as_slice())?;
        if let Some(key) = &packet.key {
            sink.write_all(key)?;
        }
        if let Some(value) = &packet.value {
            sink.write_all(value)?;
        }

        trace!(
            call_id = packet.call_id,
            operation = ?packet.operation,
            header_len,
            "packet encoded"
        );
        Ok(())
    }

    /// Decode one packet from `source`.
    ///
    /// Reads the fixed frame prefix, verifies the version byte, fills
    /// `header` with exactly the claimed header length, parses the header
    /// fields in wire order, then reads the raw key and value payloads.
    /// Zero-length payloads decode to empty (not absent) sequences.
    ///
    /// On any error the stream position is undefined for this attempt; the
    /// caller must treat the connection as broken.
    pub fn decode<R: Read>(&self, header: &mut HeaderBuffer, source: &mut R) -> Result<Packet> {
        let mut prefix = [0u8; FRAME_PREFIX_LEN];
        source.read_exact(&mut prefix)?;

        let header_len = i32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
        let key_len = i32::from_be_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]);
        let value_len = i32::from_be_bytes([prefix[8], prefix[9], prefix[10], prefix[11]]);
        let found_version = prefix[12];

        if found_version != self.version {
            warn!(
                expected = self.version,
                found = found_version,
                "packet version mismatch"
            );
            return Err(ProtocolError::VersionMismatch {
                expected: self.version,
                found: found_version,
            });
        }

        if header_len < 0 || key_len < 0 || value_len < 0 {
            return Err(ProtocolError::ProtocolViolation(
                ERR_NEGATIVE_LENGTH.to_string(),
            ));
        }
        let header_len = header_len as usize;
        let key_len = key_len as usize;
        let value_len = value_len as usize;

        if header_len > self.max_header_size {
            return Err(ProtocolError::OversizedHeader(header_len));
        }
        if key_len > self.max_payload_size {
            return Err(ProtocolError::OversizedPacket(key_len));
        }
        if value_len > self.max_payload_size {
            return Err(ProtocolError::OversizedPacket(value_len));
        }

        header.fill_from(source, header_len)?;
        let mut packet = parse_header(header)?;

        let mut key = vec![0u8; key_len];
        source.read_exact(&mut key)?;
        let mut value = vec![0u8; value_len];
        source.read_exact(&mut value)?;
        packet.key = Some(Bytes::from(key));
        packet.value = Some(Bytes::from(value));

        trace!(
            call_id = packet.call_id,
            operation = ?packet.operation,
            header_len,
            "packet decoded"
        );
        Ok(packet)
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Append the header body (everything after the frame prefix) to `header`
fn write_header(packet: &Packet, header: &mut HeaderBuffer, names: &mut NameCache) {
    header.put_u8(packet.operation.as_byte());
    header.put_i32(packet.block_id);
    header.put_i32(packet.thread_id);

    let mut flags = FLAG_CLIENT | FLAG_LOCK_ADDRESS_ABSENT;
    if packet.lock_count.is_some() {
        flags |= FLAG_LOCK_COUNT;
    }
    if packet.timeout.is_some() {
        flags |= FLAG_TIMEOUT;
    }
    if packet.ttl.is_some() {
        flags |= FLAG_TTL;
    }
    if packet.txn_id.is_some() {
        flags |= FLAG_TXN_ID;
    }
    if packet.long_value.is_some() {
        flags |= FLAG_LONG_VALUE;
    }
    if packet.version.is_some() {
        flags |= FLAG_VERSION;
    }
    header.put_u8(flags);

    if let Some(lock_count) = packet.lock_count {
        header.put_i32(lock_count);
    }
    if let Some(timeout) = packet.timeout {
        header.put_i64(timeout);
    }
    if let Some(ttl) = packet.ttl {
        header.put_i64(ttl);
    }
    if let Some(txn_id) = packet.txn_id {
        header.put_i64(txn_id);
    }
    if let Some(long_value) = packet.long_value {
        header.put_i64(long_value);
    }
    if let Some(version) = packet.version {
        header.put_i64(version);
    }

    header.put_i64(packet.call_id);
    header.put_u8(packet.response_type.as_byte());

    match packet.name.as_deref() {
        Some(name) => {
            let bytes = names.resolve(name);
            header.put_i32(bytes.len() as i32);
            header.put_slice(&bytes);
        }
        None => header.put_i32(0),
    }

    header.put_u8(packet.indexes.len() as u8);
    for index in &packet.indexes {
        header.put_i64(index.value);
        header.put_u8(index.kind);
    }
}

/// Parse the header body out of a filled scratch buffer
fn parse_header(header: &mut HeaderBuffer) -> Result<Packet> {
    let op_byte = header.get_u8()?;
    let operation = ClusterOperation::from_byte(op_byte).ok_or_else(|| {
        warn!(op_byte, "unknown operation code");
        ProtocolError::ProtocolViolation(format!("{ERR_UNKNOWN_OPERATION}: {op_byte:#04x}"))
    })?;

    let mut packet = Packet {
        operation,
        ..Packet::default()
    };
    packet.block_id = header.get_i32()?;
    packet.thread_id = header.get_i32()?;

    let flags = header.get_u8()?;
    if flags & FLAG_LOCK_COUNT != 0 {
        packet.lock_count = Some(header.get_i32()?);
    }
    if flags & FLAG_TIMEOUT != 0 {
        packet.timeout = Some(header.get_i64()?);
    }
    if flags & FLAG_TTL != 0 {
        packet.ttl = Some(header.get_i64()?);
    }
    if flags & FLAG_TXN_ID != 0 {
        packet.txn_id = Some(header.get_i64()?);
    }
    if flags & FLAG_LONG_VALUE != 0 {
        packet.long_value = Some(header.get_i64()?);
    }
    if flags & FLAG_VERSION != 0 {
        packet.version = Some(header.get_i64()?);
    }
    if flags & FLAG_LOCK_ADDRESS_ABSENT == 0 {
        warn!(?operation, "header carries a server-only lock address");
        return Err(ProtocolError::ProtocolViolation(
            ERR_LOCK_ADDRESS_PRESENT.to_string(),
        ));
    }

    packet.call_id = header.get_i64()?;

    let rt_byte = header.get_u8()?;
    packet.response_type = ResponseType::from_byte(rt_byte).ok_or_else(|| {
        warn!(rt_byte, "unknown response type");
        ProtocolError::ProtocolViolation(format!("{ERR_UNKNOWN_RESPONSE_TYPE}: {rt_byte:#04x}"))
    })?;

    let name_len = header.get_i32()?;
    if name_len < 0 {
        return Err(ProtocolError::ProtocolViolation(
            ERR_NEGATIVE_NAME_LENGTH.to_string(),
        ));
    }
    if name_len > 0 {
        let bytes = header.get_slice(name_len as usize)?;
        let name = std::str::from_utf8(bytes)
            .map_err(|_| ProtocolError::ProtocolViolation(ERR_NAME_NOT_UTF8.to_string()))?;
        packet.name = Some(name.to_string());
    }

    let index_count = header.get_u8()? as usize;
    if index_count > MAX_INDEXES {
        return Err(ProtocolError::ProtocolViolation(format!(
            "{ERR_INDEX_COUNT}: {index_count}"
        )));
    }
    packet.indexes.reserve(index_count);
    for _ in 0..index_count {
        let value = header.get_i64()?;
        let kind = header.get_u8()?;
        packet.indexes.push(Index { value, kind });
    }

    Ok(packet)
}
