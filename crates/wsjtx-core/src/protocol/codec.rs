//! Binary codec for WSJT-X UDP messages.
//!
//! Wire format:
//! ```text
//! [magic:4][schema:4][message_type:4][payload:N]
//! ```
//! The envelope is 12 bytes.  All multi-byte integers and floats are
//! big-endian.  Payload fields are written back to back with no tags or
//! padding, so every record is read and written in one fixed field order.

use std::io::{Read, Write};

use thiserror::Error;

use crate::protocol::messages::{
    Close, DecodeRecord, Envelope, Heartbeat, Message, MessageType, ReplyModifiers, ReplyRecord,
    ENVELOPE_SIZE, MAGIC, SCHEMA_VERSION,
};
use crate::protocol::primitives::{WireReader, WireWriter};

/// Errors that can occur during message encoding or decoding.
///
/// Every variant aborts the current message.  The stream position after an
/// error is meaningless; callers must discard the rest of the datagram.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// The stream ended before the field's declared width was available.
    #[error("short read on `{field}`: need {needed} bytes, got {available}")]
    ShortRead {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    /// The source failed for a reason other than running out of bytes.
    #[error("read failed on `{field}`: {kind}")]
    ReadFailed {
        field: &'static str,
        kind: std::io::ErrorKind,
    },

    /// The sink rejected or truncated a write.
    #[error("write failed on `{field}`: {kind}")]
    WriteFailed {
        field: &'static str,
        kind: std::io::ErrorKind,
    },

    /// A string payload was not valid UTF-8.
    #[error("invalid UTF-8 in `{field}` at byte {position}")]
    InvalidUtf8 { field: &'static str, position: usize },

    /// The string is too long to carry a 32-bit length prefix.
    #[error("string of {0} bytes cannot be length-prefixed")]
    StringTooLong(usize),

    /// A raw payload was given a type code that has its own layout.
    #[error("type code {0} has a modelled layout and cannot be sent as raw bytes")]
    ModelledTypeAsRaw(u32),

    /// The cursor was used again after an earlier failure.
    #[error("stream abandoned after an earlier failure")]
    StreamAbandoned,
}

// ── Record trait ──────────────────────────────────────────────────────────────

/// A value with a fixed field layout on the wire.
///
/// Implementations read every field into a local before building `Self`, so a
/// failure part-way through never yields a partially filled record.
pub trait WireFormat: Sized {
    /// Reads one value starting at the reader's current position.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProtocolError`] hit by any field.
    fn read_from<R: Read>(r: &mut WireReader<R>) -> Result<Self, ProtocolError>;

    /// Appends this value to the writer.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProtocolError`] hit by any field.
    fn write_to<W: Write>(&self, w: &mut WireWriter<W>) -> Result<(), ProtocolError>;
}

impl WireFormat for Envelope {
    fn read_from<R: Read>(r: &mut WireReader<R>) -> Result<Self, ProtocolError> {
        let magic = r.read_u32("magic")?;
        let schema = r.read_u32("schema")?;
        let message_type = r.read_u32("message_type")?;
        Ok(Envelope {
            magic,
            schema,
            message_type,
        })
    }

    fn write_to<W: Write>(&self, w: &mut WireWriter<W>) -> Result<(), ProtocolError> {
        w.write_u32("magic", self.magic)?;
        w.write_u32("schema", self.schema)?;
        w.write_u32("message_type", self.message_type)
    }
}

impl WireFormat for Heartbeat {
    fn read_from<R: Read>(r: &mut WireReader<R>) -> Result<Self, ProtocolError> {
        let id = r.read_utf8("id")?;
        let max_schema = r.read_u32("max_schema")?;
        let version = r.read_utf8("version")?;
        let revision = r.read_utf8("revision")?;
        Ok(Heartbeat {
            id,
            max_schema,
            version,
            revision,
        })
    }

    fn write_to<W: Write>(&self, w: &mut WireWriter<W>) -> Result<(), ProtocolError> {
        w.write_utf8("id", &self.id)?;
        w.write_u32("max_schema", self.max_schema)?;
        w.write_utf8("version", &self.version)?;
        w.write_utf8("revision", &self.revision)
    }
}

impl WireFormat for DecodeRecord {
    fn read_from<R: Read>(r: &mut WireReader<R>) -> Result<Self, ProtocolError> {
        let id = r.read_utf8("id")?;
        let is_new = r.read_bool("is_new")?;
        let time = r.read_time("time")?;
        let snr = r.read_i32("snr")?;
        let delta_time = r.read_f64("delta_time")?;
        let delta_frequency = r.read_u32("delta_frequency")?;
        let mode = r.read_utf8("mode")?;
        let message = r.read_utf8("message")?;
        let low_confidence = r.read_bool("low_confidence")?;
        let off_air = r.read_bool("off_air")?;
        Ok(DecodeRecord {
            id,
            is_new,
            time,
            snr,
            delta_time,
            delta_frequency,
            mode,
            message,
            low_confidence,
            off_air,
        })
    }

    fn write_to<W: Write>(&self, w: &mut WireWriter<W>) -> Result<(), ProtocolError> {
        w.write_utf8("id", &self.id)?;
        w.write_bool("is_new", self.is_new)?;
        w.write_time("time", self.time)?;
        w.write_i32("snr", self.snr)?;
        w.write_f64("delta_time", self.delta_time)?;
        w.write_u32("delta_frequency", self.delta_frequency)?;
        w.write_utf8("mode", &self.mode)?;
        w.write_utf8("message", &self.message)?;
        w.write_bool("low_confidence", self.low_confidence)?;
        w.write_bool("off_air", self.off_air)
    }
}

impl WireFormat for ReplyRecord {
    fn read_from<R: Read>(r: &mut WireReader<R>) -> Result<Self, ProtocolError> {
        let id = r.read_utf8("id")?;
        let time = r.read_time("time")?;
        let snr = r.read_i32("snr")?;
        let delta_time = r.read_f64("delta_time")?;
        let delta_frequency = r.read_u32("delta_frequency")?;
        let mode = r.read_utf8("mode")?;
        let message = r.read_utf8("message")?;
        let low_confidence = r.read_bool("low_confidence")?;
        let modifiers = ReplyModifiers(r.read_u8("modifiers")?);
        Ok(ReplyRecord {
            id,
            time,
            snr,
            delta_time,
            delta_frequency,
            mode,
            message,
            low_confidence,
            modifiers,
        })
    }

    fn write_to<W: Write>(&self, w: &mut WireWriter<W>) -> Result<(), ProtocolError> {
        w.write_utf8("id", &self.id)?;
        w.write_time("time", self.time)?;
        w.write_i32("snr", self.snr)?;
        w.write_f64("delta_time", self.delta_time)?;
        w.write_u32("delta_frequency", self.delta_frequency)?;
        w.write_utf8("mode", &self.mode)?;
        w.write_utf8("message", &self.message)?;
        w.write_bool("low_confidence", self.low_confidence)?;
        w.write_u8("modifiers", self.modifiers.0)
    }
}

impl WireFormat for Close {
    fn read_from<R: Read>(r: &mut WireReader<R>) -> Result<Self, ProtocolError> {
        let id = r.read_utf8("id")?;
        Ok(Close { id })
    }

    fn write_to<W: Write>(&self, w: &mut WireWriter<W>) -> Result<(), ProtocolError> {
        w.write_utf8("id", &self.id)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Reads the payload that follows an envelope already taken from `r`.
///
/// `message_type` is the caller's choice, normally the envelope's own value.
/// Type codes without a modelled layout drain the rest of the stream into
/// [`Message::Unrecognized`].
///
/// # Errors
///
/// Returns [`ProtocolError`] if any payload field fails to decode.
pub fn read_payload<R: Read>(
    message_type: u32,
    r: &mut WireReader<R>,
) -> Result<Message, ProtocolError> {
    match MessageType::try_from(message_type) {
        Ok(MessageType::Heartbeat) => Heartbeat::read_from(r).map(Message::Heartbeat),
        Ok(MessageType::Decode) => DecodeRecord::read_from(r).map(Message::Decode),
        Ok(MessageType::Reply) => ReplyRecord::read_from(r).map(Message::Reply),
        Ok(MessageType::Close) => Close::read_from(r).map(Message::Close),
        _ => {
            let payload = r.read_remaining("payload")?;
            Ok(Message::Unrecognized {
                message_type,
                payload,
            })
        }
    }
}

/// Writes the payload of `msg` with no envelope.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the sink fails or a string is too long, and
/// [`ProtocolError::ModelledTypeAsRaw`] for a [`Message::Unrecognized`] whose
/// type code would decode as a different variant.
pub fn write_payload<W: Write>(msg: &Message, w: &mut WireWriter<W>) -> Result<(), ProtocolError> {
    match msg {
        Message::Heartbeat(m) => m.write_to(w),
        Message::Decode(m) => m.write_to(w),
        Message::Reply(m) => m.write_to(w),
        Message::Close(m) => m.write_to(w),
        Message::Unrecognized {
            message_type,
            payload,
        } => {
            if MessageType::try_from(*message_type).is_ok_and(MessageType::is_modelled) {
                return Err(ProtocolError::ModelledTypeAsRaw(*message_type));
            }
            w.write_raw("payload", payload)
        }
    }
}

/// Decodes one datagram: envelope, then the payload it announces.
///
/// No magic or schema validation happens here; inspect the returned
/// [`Envelope`] to decide whether the datagram is wanted.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the envelope or payload is truncated or
/// malformed.
///
/// # Examples
///
/// ```rust
/// use wsjtx_core::protocol::{decode_message, encode_message, Close, Message};
///
/// let msg = Message::Close(Close { id: "WSJT-X".to_string() });
/// let bytes = encode_message(&msg).unwrap();
/// let (envelope, decoded) = decode_message(&bytes).unwrap();
/// assert_eq!(envelope.message_type, 6);
/// assert_eq!(decoded, msg);
/// ```
pub fn decode_message(bytes: &[u8]) -> Result<(Envelope, Message), ProtocolError> {
    let mut r = WireReader::new(bytes);
    let envelope = Envelope::read_from(&mut r)?;
    let msg = read_payload(envelope.message_type, &mut r)?;
    Ok((envelope, msg))
}

/// Encodes `msg` behind a conforming envelope ([`MAGIC`], [`SCHEMA_VERSION`]).
///
/// # Errors
///
/// Returns [`ProtocolError`] if a string field is too long to prefix, or
/// [`ProtocolError::ModelledTypeAsRaw`] as for [`write_payload`].
pub fn encode_message(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let envelope = Envelope {
        magic: MAGIC,
        schema: SCHEMA_VERSION,
        message_type: msg.message_type(),
    };
    let mut w = WireWriter::new(Vec::with_capacity(ENVELOPE_SIZE + 64));
    envelope.write_to(&mut w)?;
    write_payload(msg, &mut w)?;
    Ok(w.into_inner())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
