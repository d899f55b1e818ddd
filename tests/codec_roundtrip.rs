#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Integration tests for the packet codec: round-trips, version checking,
//! bitmask minimality, invariant enforcement, and the name cache.

use bytes::Bytes;
use gridwire::config::{FRAME_PREFIX_LEN, PACKET_VERSION};
use gridwire::core::codec::PacketCodec;
use gridwire::core::header::{
    HeaderBuffer, FLAG_CLIENT, FLAG_LOCK_ADDRESS_ABSENT, FLAG_TTL,
};
use gridwire::core::packet::{ClusterOperation, Packet, ResponseType};
use gridwire::error::ProtocolError;
use gridwire::utils::name_cache::NameCache;

// Offset of the presence bitmask within an encoded frame:
// 13-byte prefix + operation (1) + block id (4) + thread id (4)
const FLAGS_OFFSET: usize = FRAME_PREFIX_LEN + 9;

fn encode(codec: &PacketCodec, packet: &Packet) -> Vec<u8> {
    let mut header = HeaderBuffer::new();
    let mut names = NameCache::new();
    let mut out = Vec::new();
    codec
        .encode(packet, &mut header, &mut names, &mut out)
        .expect("encode should succeed");
    out
}

fn decode(codec: &PacketCodec, bytes: &[u8]) -> Result<Packet, ProtocolError> {
    let mut header = HeaderBuffer::new();
    codec.decode(&mut header, &mut &bytes[..])
}

/// Round-trip helper: absent key/value decodes as empty, so equality is
/// checked against the normalized original.
fn normalized(mut packet: Packet) -> Packet {
    packet.key = Some(packet.key.unwrap_or_else(Bytes::new));
    packet.value = Some(packet.value.unwrap_or_else(Bytes::new));
    if packet.name.as_deref() == Some("") {
        packet.name = None;
    }
    packet
}

// ============================================================================
// ROUND-TRIP
// ============================================================================

#[test]
fn test_concrete_scenario_orders() {
    let codec = PacketCodec::new();
    let mut packet = Packet::request(
        "orders",
        ClusterOperation::MapPut,
        Some(Bytes::from_static(&[0x01, 0x02])),
        Some(Bytes::new()),
    );
    packet.ttl = Some(5000);
    packet.call_id = 42;

    let bytes = encode(&codec, &packet);

    // Header: op(1) + block(4) + thread(4) + flags(1) + ttl(8) + call(8)
    // + response(1) + name len(4) + "orders"(6) + index count(1) = 38
    let header_len = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(header_len, 38);

    // Exactly bits 2 (ttl), 6 (client), 7 (lock address absent)
    assert_eq!(
        bytes[FLAGS_OFFSET],
        FLAG_TTL | FLAG_CLIENT | FLAG_LOCK_ADDRESS_ABSENT
    );

    // Index count byte is the last header byte
    assert_eq!(bytes[FRAME_PREFIX_LEN + 37], 0);

    let decoded = decode(&codec, &bytes).expect("decode should succeed");
    assert_eq!(decoded.name.as_deref(), Some("orders"));
    assert_eq!(decoded.ttl, Some(5000));
    assert_eq!(decoded.call_id, 42);
    assert_eq!(decoded.key.as_deref(), Some(&[0x01, 0x02][..]));
    assert_eq!(decoded.value.as_deref(), Some(&[][..]));
    assert_eq!(decoded, normalized(packet));
}

#[test]
fn test_full_packet_roundtrip() {
    let codec = PacketCodec::new();
    let mut packet = Packet {
        name: Some("inventory".to_string()),
        operation: ClusterOperation::MapLock,
        key: Some(Bytes::from_static(b"widget")),
        value: Some(Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF])),
        block_id: 17,
        thread_id: -3,
        lock_count: Some(2),
        timeout: Some(30_000),
        ttl: Some(60_000),
        txn_id: Some(991),
        long_value: Some(i64::MIN),
        version: Some(7),
        call_id: 123_456_789,
        response_type: ResponseType::Success,
        indexes: Vec::new(),
    };
    packet.add_index(-1, 1).unwrap();
    packet.add_index(i64::MAX, 0xFF).unwrap();

    let bytes = encode(&codec, &packet);
    let decoded = decode(&codec, &bytes).expect("decode should succeed");
    assert_eq!(decoded, packet);
}

#[test]
fn test_absent_and_empty_payloads_are_indistinguishable() {
    let codec = PacketCodec::new();

    let absent = Packet::default();
    let empty = Packet {
        key: Some(Bytes::new()),
        value: Some(Bytes::new()),
        ..Packet::default()
    };

    let bytes_absent = encode(&codec, &absent);
    let bytes_empty = encode(&codec, &empty);
    assert_eq!(bytes_absent, bytes_empty);

    // Decode always yields empty, never absent
    let decoded = decode(&codec, &bytes_absent).expect("decode should succeed");
    assert_eq!(decoded.key.as_deref(), Some(&[][..]));
    assert_eq!(decoded.value.as_deref(), Some(&[][..]));
}

#[test]
fn test_empty_name_decodes_as_absent() {
    let codec = PacketCodec::new();
    let packet = Packet {
        name: Some(String::new()),
        ..Packet::default()
    };

    let decoded = decode(&codec, &encode(&codec, &packet)).expect("decode should succeed");
    assert_eq!(decoded.name, None);
}

#[test]
fn test_non_ascii_name_roundtrip() {
    let codec = PacketCodec::new();
    let packet = Packet::request("übersicht-bestellungen", ClusterOperation::MapGet, None, None);

    let decoded = decode(&codec, &encode(&codec, &packet)).expect("decode should succeed");
    assert_eq!(decoded.name.as_deref(), Some("übersicht-bestellungen"));
}

#[test]
fn test_long_name_roundtrip() {
    let codec = PacketCodec::new();
    let long_name = "q".repeat(4096);
    let packet = Packet {
        name: Some(long_name.clone()),
        ..Packet::default()
    };

    let decoded = decode(&codec, &encode(&codec, &packet)).expect("decode should succeed");
    assert_eq!(decoded.name.as_deref(), Some(long_name.as_str()));
}

// ============================================================================
// BITMASK MINIMALITY
// ============================================================================

#[test]
fn test_all_absent_optionals_write_no_field_bytes() {
    let codec = PacketCodec::new();
    let bytes = encode(&codec, &Packet::default());

    // Only always-present header fields: 1 + 4 + 4 + 1 + 8 + 1 + 4 + 1 = 24
    let header_len = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(header_len, 24);
    assert_eq!(bytes.len(), FRAME_PREFIX_LEN + 24);

    // Only the two invariant bits are set
    assert_eq!(bytes[FLAGS_OFFSET], FLAG_CLIENT | FLAG_LOCK_ADDRESS_ABSENT);

    let decoded = decode(&codec, &bytes).expect("decode should succeed");
    assert_eq!(decoded.lock_count, None);
    assert_eq!(decoded.timeout, None);
    assert_eq!(decoded.ttl, None);
    assert_eq!(decoded.txn_id, None);
    assert_eq!(decoded.long_value, None);
    assert_eq!(decoded.version, None);
}

#[test]
fn test_header_len_accounts_for_each_present_field() {
    let codec = PacketCodec::new();

    // lock count adds 4 bytes
    let packet = Packet {
        lock_count: Some(1),
        ..Packet::default()
    };
    let bytes = encode(&codec, &packet);
    assert_eq!(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 28);

    // each 64-bit optional adds 8 bytes
    let packet = Packet {
        timeout: Some(1),
        txn_id: Some(2),
        ..Packet::default()
    };
    let bytes = encode(&codec, &packet);
    assert_eq!(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 40);
}

// ============================================================================
// VERSION CHECK
// ============================================================================

#[test]
fn test_version_mismatch_is_fatal() {
    let encoder = PacketCodec::new();
    let decoder = PacketCodec::with_version(PACKET_VERSION + 1);

    let bytes = encode(&encoder, &Packet::default());
    match decode(&decoder, &bytes) {
        Err(ProtocolError::VersionMismatch { expected, found }) => {
            assert_eq!(expected, PACKET_VERSION + 1);
            assert_eq!(found, PACKET_VERSION);
        }
        other => panic!("Expected VersionMismatch, got {other:?}"),
    }
}

#[test]
fn test_matching_nonstandard_versions_interoperate() {
    let codec = PacketCodec::with_version(42);
    let bytes = encode(&codec, &Packet::default());
    assert_eq!(bytes[12], 42);
    assert!(decode(&codec, &bytes).is_ok());
}

// ============================================================================
// INVARIANT ENFORCEMENT
// ============================================================================

#[test]
fn test_lock_address_bit_must_be_set() {
    let codec = PacketCodec::new();
    let mut bytes = encode(&codec, &Packet::default());
    bytes[FLAGS_OFFSET] &= !FLAG_LOCK_ADDRESS_ABSENT;

    match decode(&codec, &bytes) {
        Err(ProtocolError::ProtocolViolation(msg)) => {
            assert!(msg.contains("Lock address"), "unexpected message: {msg}");
        }
        other => panic!("Expected ProtocolViolation, got {other:?}"),
    }
}

#[test]
fn test_index_count_above_ten_rejected_on_decode() {
    let codec = PacketCodec::new();
    let mut packet = Packet::default();
    for i in 0..10 {
        packet.add_index(i, 0).unwrap();
    }
    let mut bytes = encode(&codec, &packet);

    // Index count is the last header byte; forge it past the bound. The
    // header is long enough (10 x 9 index bytes) that parsing reaches the
    // count check rather than truncating first.
    let count_offset = bytes.len() - 10 * 9 - 1;
    bytes[count_offset] = 11;

    assert!(matches!(
        decode(&codec, &bytes),
        Err(ProtocolError::ProtocolViolation(_))
    ));
}

#[test]
fn test_ten_indexes_roundtrip_in_order() {
    let codec = PacketCodec::new();
    let mut packet = Packet::default();
    for i in 0..10i64 {
        packet.add_index(i * 100, i as u8).unwrap();
    }

    let decoded = decode(&codec, &encode(&codec, &packet)).expect("decode should succeed");
    assert_eq!(decoded.indexes.len(), 10);
    for (i, index) in decoded.indexes.iter().enumerate() {
        assert_eq!(index.value, i as i64 * 100);
        assert_eq!(index.kind, i as u8);
    }
}

#[test]
fn test_unknown_response_type_rejected() {
    let codec = PacketCodec::new();
    let clean = encode(&codec, &Packet::default());

    // Response type follows the always-present fields and call id:
    // prefix(13) + op(1) + block(4) + thread(4) + flags(1) + call(8)
    let rt_offset = FRAME_PREFIX_LEN + 18;
    assert_eq!(clean[rt_offset], ResponseType::None.as_byte());

    for forged in [0x00u8, 0x01, 0x06, 0xFF] {
        let mut bytes = clean.clone();
        bytes[rt_offset] = forged;
        match decode(&codec, &bytes) {
            Err(ProtocolError::ProtocolViolation(msg)) => {
                assert!(msg.contains("response type"), "unexpected message: {msg}");
            }
            other => panic!("Expected ProtocolViolation for {forged:#04x}, got {other:?}"),
        }
    }
}

#[test]
fn test_name_bytes_must_be_utf8() {
    let codec = PacketCodec::new();
    let packet = Packet::request("orders", ClusterOperation::MapGet, None, None);
    let mut bytes = encode(&codec, &packet);

    // Name bytes follow the length-prefixed fixed fields:
    // prefix(13) + op(1) + block(4) + thread(4) + flags(1) + call(8)
    // + response(1) + name len(4)
    let name_offset = FRAME_PREFIX_LEN + 23;
    assert_eq!(&bytes[name_offset..name_offset + 6], b"orders");

    // 0xFF never appears in well-formed UTF-8
    bytes[name_offset] = 0xFF;
    bytes[name_offset + 1] = 0xFE;

    match decode(&codec, &bytes) {
        Err(ProtocolError::ProtocolViolation(msg)) => {
            assert!(msg.contains("UTF-8"), "unexpected message: {msg}");
        }
        other => panic!("Expected ProtocolViolation, got {other:?}"),
    }
}

#[test]
fn test_truncated_stream_fails_with_io_error() {
    let codec = PacketCodec::new();
    let bytes = encode(&codec, &Packet::default());

    // Cut the stream mid-header
    assert!(matches!(
        decode(&codec, &bytes[..FRAME_PREFIX_LEN + 3]),
        Err(ProtocolError::Io(_))
    ));

    // Cut the stream mid-prefix
    assert!(matches!(
        decode(&codec, &bytes[..7]),
        Err(ProtocolError::Io(_))
    ));
}

// ============================================================================
// NAME CACHE
// ============================================================================

#[test]
fn test_encode_populates_name_cache() {
    let codec = PacketCodec::new();
    let mut header = HeaderBuffer::new();
    let mut names = NameCache::new();

    let packet = Packet::request("orders", ClusterOperation::MapGet, None, None);
    let mut out = Vec::new();
    codec
        .encode(&packet, &mut header, &mut names, &mut out)
        .expect("encode should succeed");

    assert_eq!(names.len(), 1);

    // A second encode of the same name reuses the cached bytes
    let cached = names.resolve("orders");
    let mut out2 = Vec::new();
    codec
        .encode(&packet, &mut header, &mut names, &mut out2)
        .expect("encode should succeed");
    assert_eq!(names.len(), 1);
    assert!(std::sync::Arc::ptr_eq(&cached, &names.resolve("orders")));
    assert_eq!(out, out2);
}

#[test]
fn test_cache_reset_mid_connection_is_invisible_on_the_wire() {
    let codec = PacketCodec::new();
    let mut header = HeaderBuffer::new();
    let mut names = NameCache::with_limit(2);

    let packet = Packet::request("orders", ClusterOperation::MapGet, None, None);
    let mut before = Vec::new();
    codec
        .encode(&packet, &mut header, &mut names, &mut before)
        .expect("encode should succeed");

    // Push the cache over its limit so "orders" gets evicted
    names.resolve("a");
    names.resolve("b");
    assert_eq!(names.len(), 1);

    let mut after = Vec::new();
    codec
        .encode(&packet, &mut header, &mut names, &mut after)
        .expect("encode should succeed");
    assert_eq!(before, after);
}
