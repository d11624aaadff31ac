//! Integration tests for the wsjtx-core protocol codec.
//!
//! These tests drive the public API only: the whole-datagram helpers, the
//! `WireFormat` records and the primitive cursors together.

use wsjtx_core::{
    decode_message, encode_message,
    protocol::{
        messages::{Close, Heartbeat, ENVELOPE_SIZE, MAGIC, SCHEMA_VERSION},
        read_payload,
    },
    DecodeRecord, Envelope, Message, MessageType, ProtocolError, ReplyModifiers, ReplyRecord,
    WireFormat, WireReader, WireWriter,
};

/// Encodes a message and decodes it back, asserting the envelope is conforming.
fn roundtrip(msg: Message) -> Message {
    let bytes = encode_message(&msg).expect("encode must succeed");
    let (envelope, decoded) = decode_message(&bytes).expect("decode must succeed");
    assert_eq!(envelope.magic, MAGIC);
    assert_eq!(envelope.schema, SCHEMA_VERSION);
    assert_eq!(envelope.message_type, msg.message_type());
    decoded
}

fn cq_decode() -> DecodeRecord {
    DecodeRecord {
        id: "ABC123".to_string(),
        is_new: true,
        time: 120_000,
        snr: -5,
        delta_time: 0.5,
        delta_frequency: 1500,
        mode: "FT8".to_string(),
        message: "CQ KR0OT DN40".to_string(),
        low_confidence: false,
        off_air: false,
    }
}

#[test]
fn test_roundtrip_decode_message() {
    let original = Message::Decode(cq_decode());
    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_roundtrip_reply_message() {
    let original = Message::Reply(ReplyRecord::from_decode(
        &cq_decode(),
        ReplyModifiers(ReplyModifiers::NONE),
    ));
    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_roundtrip_heartbeat_and_close() {
    let heartbeat = Message::Heartbeat(Heartbeat {
        id: "WSJT-X".to_string(),
        max_schema: 2,
        version: "2.0.0".to_string(),
        revision: "r8366".to_string(),
    });
    let close = Message::Close(Close {
        id: "WSJT-X".to_string(),
    });

    assert_eq!(heartbeat, roundtrip(heartbeat.clone()));
    assert_eq!(close, roundtrip(close.clone()));
}

#[test]
fn test_roundtrip_decode_with_unicode_and_empty_fields() {
    let original = Message::Decode(DecodeRecord {
        id: String::new(),
        is_new: false,
        time: 0,
        snr: i32::MIN,
        delta_time: -3.75,
        delta_frequency: u32::MAX,
        mode: "~".to_string(),
        message: "TNX 73 ÆØÅ".to_string(),
        low_confidence: true,
        off_air: true,
    });
    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_envelope_scenario_literal_bytes() {
    let mut w = WireWriter::new(Vec::new());
    Envelope {
        magic: 0xADBC_CBDA,
        schema: 2,
        message_type: 2,
    }
    .write_to(&mut w)
    .expect("envelope write");
    let bytes = w.into_inner();

    assert_eq!(
        bytes,
        [0xAD, 0xBC, 0xCB, 0xDA, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x02]
    );
    assert_eq!(bytes.len(), ENVELOPE_SIZE);

    let mut r = WireReader::new(&bytes[..]);
    assert_eq!(
        Envelope::read_from(&mut r).expect("envelope read"),
        Envelope::new(MessageType::Decode)
    );
}

#[test]
fn test_caller_driven_envelope_then_payload() {
    // The receive path reads the envelope, decides, and only then reads on.
    let bytes = encode_message(&Message::Decode(cq_decode())).expect("encode");
    let mut r = WireReader::new(&bytes[..]);

    let envelope = Envelope::read_from(&mut r).expect("envelope");
    assert_eq!(r.position(), ENVELOPE_SIZE);
    assert_eq!(envelope.known_type(), Some(MessageType::Decode));

    let decode = DecodeRecord::read_from(&mut r).expect("decode");
    assert_eq!(decode, cq_decode());
    assert_eq!(r.position(), bytes.len());
}

#[test]
fn test_truncated_datagram_never_decodes() {
    let bytes = encode_message(&Message::Decode(cq_decode())).expect("encode");
    for cut in 1..=bytes.len() {
        let truncated = &bytes[..bytes.len() - cut];
        assert!(
            decode_message(truncated).is_err(),
            "datagram missing {cut} trailing bytes decoded successfully"
        );
    }
}

#[test]
fn test_reader_cannot_be_reused_after_failure() {
    let bytes = encode_message(&Message::Decode(cq_decode())).expect("encode");
    let mut r = WireReader::new(&bytes[..20]);
    let envelope = Envelope::read_from(&mut r).expect("envelope fits");

    assert!(read_payload(envelope.message_type, &mut r).is_err());
    assert_eq!(
        read_payload(envelope.message_type, &mut r),
        Err(ProtocolError::StreamAbandoned)
    );
}

#[test]
fn test_reply_written_into_fixed_buffer_fails_when_too_small() {
    let reply = ReplyRecord::from_decode(&cq_decode(), ReplyModifiers::default());
    let mut storage = [0u8; 16];
    let mut w = WireWriter::new(&mut storage[..]);

    let result = reply.write_to(&mut w);

    assert!(matches!(result, Err(ProtocolError::WriteFailed { .. })));
    assert!(w.is_abandoned());
}
