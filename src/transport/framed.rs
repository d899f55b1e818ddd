//! # Framed Adapter
//!
//! Bridges the sans-io [`PacketCodec`] to `tokio_util::codec` so a
//! connection layer can drive it over a `Framed` byte stream.
//!
//! One `PacketFramer` per connection direction: it owns the direction's
//! scratch buffer and name cache, so a concurrent send and receive on the
//! same connection each get their own state (sharing one scratch buffer
//! between the two is unsafe, and `&mut self` here makes it impossible).
//!
//! `decode` consumes nothing until a complete frame is buffered, so partial
//! reads never disturb stream alignment. Length claims are validated before
//! waiting for more bytes, so a hostile prefix cannot force unbounded
//! buffering.

use crate::config::{ProtocolConfig, FRAME_PREFIX_LEN};
use crate::core::codec::PacketCodec;
use crate::core::header::HeaderBuffer;
use crate::core::packet::Packet;
use crate::error::constants::ERR_NEGATIVE_LENGTH;
use crate::error::ProtocolError;
use crate::utils::name_cache::NameCache;
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// `Encoder`/`Decoder` implementation wrapping a [`PacketCodec`] together
/// with its per-connection scratch buffer and name cache
#[derive(Debug)]
pub struct PacketFramer {
    codec: PacketCodec,
    header: HeaderBuffer,
    names: NameCache,
}

impl PacketFramer {
    /// Framer for the current protocol version with default limits
    pub fn new() -> Self {
        Self::with_codec(PacketCodec::new())
    }

    /// Framer around an existing codec
    pub fn with_codec(codec: PacketCodec) -> Self {
        Self {
            codec,
            header: HeaderBuffer::new(),
            names: NameCache::new(),
        }
    }

    /// Framer configured from a [`ProtocolConfig`]
    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self {
            codec: PacketCodec::from_config(config),
            header: HeaderBuffer::with_capacity(config.header_capacity),
            names: NameCache::with_limit(config.name_cache_limit),
        }
    }

    /// The wrapped codec
    pub fn codec(&self) -> &PacketCodec {
        &self.codec
    }
}

impl Default for PacketFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<Packet> for PacketFramer {
    type Error = ProtocolError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut writer = dst.writer();
        self.codec
            .encode(&item, &mut self.header, &mut self.names, &mut writer)
    }
}

impl Decoder for PacketFramer {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, Self::Error> {
        if src.len() < FRAME_PREFIX_LEN {
            return Ok(None);
        }

        let header_len = i32::from_be_bytes([src[0], src[1], src[2], src[3]]);
        let key_len = i32::from_be_bytes([src[4], src[5], src[6], src[7]]);
        let value_len = i32::from_be_bytes([src[8], src[9], src[10], src[11]]);

        if header_len < 0 || key_len < 0 || value_len < 0 {
            return Err(ProtocolError::ProtocolViolation(
                ERR_NEGATIVE_LENGTH.to_string(),
            ));
        }
        let header_len = header_len as usize;
        let key_len = key_len as usize;
        let value_len = value_len as usize;

        // Reject hostile claims before buffering toward them
        if header_len > self.codec.max_header_size() {
            return Err(ProtocolError::OversizedHeader(header_len));
        }
        if key_len > self.codec.max_payload_size() {
            return Err(ProtocolError::OversizedPacket(key_len));
        }
        if value_len > self.codec.max_payload_size() {
            return Err(ProtocolError::OversizedPacket(value_len));
        }

        let total = FRAME_PREFIX_LEN + header_len + key_len + value_len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let frame = src.split_to(total);
        let mut reader: &[u8] = &frame;
        self.codec.decode(&mut self.header, &mut reader).map(Some)
    }
}
