//! WSJT-X UDP message types.
//!
//! Every datagram starts with a 12-byte [`Envelope`] followed by a payload
//! whose layout is selected by [`Envelope::message_type`].  Field order inside
//! each payload is part of the wire contract and is not recoverable from the
//! bytes themselves.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Identifies a datagram as belonging to the WSJT-X protocol family.
pub const MAGIC: u32 = 0xADBC_CBDA;

/// Schema number this implementation speaks.
pub const SCHEMA_VERSION: u32 = 2;

/// Size of the envelope in bytes: magic, schema and message type.
pub const ENVELOPE_SIZE: usize = 12;

/// String length prefix denoting a null string.  No payload bytes follow it.
pub const STRING_NULL_SENTINEL: u32 = 0xFFFF_FFFF;

// ── Message type codes ────────────────────────────────────────────────────────

/// Message type codes defined by the protocol family.
///
/// Only some of these have a modelled payload (see [`Message`]); the rest
/// decode as [`Message::Unrecognized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum MessageType {
    Heartbeat = 0,
    Status = 1,
    Decode = 2,
    Clear = 3,
    Reply = 4,
    QsoLogged = 5,
    Close = 6,
    Replay = 7,
    HaltTx = 8,
    FreeText = 9,
    WsprDecode = 10,
    Location = 11,
    LoggedAdif = 12,
    HighlightCallsign = 13,
    SwitchConfiguration = 14,
    Configure = 15,
}

impl MessageType {
    /// Numeric code as carried in the envelope.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Whether this crate decodes the type into its own [`Message`] variant.
    pub fn is_modelled(self) -> bool {
        matches!(
            self,
            MessageType::Heartbeat | MessageType::Decode | MessageType::Reply | MessageType::Close
        )
    }
}

impl TryFrom<u32> for MessageType {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, ()> {
        match value {
            0 => Ok(MessageType::Heartbeat),
            1 => Ok(MessageType::Status),
            2 => Ok(MessageType::Decode),
            3 => Ok(MessageType::Clear),
            4 => Ok(MessageType::Reply),
            5 => Ok(MessageType::QsoLogged),
            6 => Ok(MessageType::Close),
            7 => Ok(MessageType::Replay),
            8 => Ok(MessageType::HaltTx),
            9 => Ok(MessageType::FreeText),
            10 => Ok(MessageType::WsprDecode),
            11 => Ok(MessageType::Location),
            12 => Ok(MessageType::LoggedAdif),
            13 => Ok(MessageType::HighlightCallsign),
            14 => Ok(MessageType::SwitchConfiguration),
            15 => Ok(MessageType::Configure),
            _ => Err(()),
        }
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// 12-byte header at the start of every datagram.
///
/// The codec does not validate `magic` or `schema`; whether a datagram is
/// "for us" is the receiver's policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub magic: u32,
    pub schema: u32,
    /// Selects how the rest of the datagram is interpreted.
    pub message_type: u32,
}

impl Envelope {
    /// Conforming envelope ([`MAGIC`], [`SCHEMA_VERSION`]) for `message_type`.
    pub fn new(message_type: MessageType) -> Self {
        Self {
            magic: MAGIC,
            schema: SCHEMA_VERSION,
            message_type: message_type.as_u32(),
        }
    }

    /// The type code as a known [`MessageType`], if it is one.
    pub fn known_type(&self) -> Option<MessageType> {
        MessageType::try_from(self.message_type).ok()
    }
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// HEARTBEAT (0): periodic liveness message from either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Unique key of the sending application instance.
    pub id: String,
    /// Highest schema number the sender understands.
    pub max_schema: u32,
    pub version: String,
    pub revision: String,
}

/// DECODE (2): one decoded signal reported by WSJT-X.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeRecord {
    pub id: String,
    /// `false` when the decode is a replay of an earlier band activity line.
    pub is_new: bool,
    pub time: u32,
    /// Signal-to-noise ratio in dB.
    pub snr: i32,
    /// Time offset of the signal in seconds.
    pub delta_time: f64,
    /// Audio frequency offset in Hz.
    pub delta_frequency: u32,
    pub mode: String,
    /// Decoded free text, e.g. `"CQ KR0OT DN40"`.
    pub message: String,
    pub low_confidence: bool,
    /// Set when the decode came from a replayed recording.
    pub off_air: bool,
}

/// Keyboard modifier flags carried by [`ReplyRecord::modifiers`].
///
/// They mimic the modifiers a user would hold while double-clicking the
/// decode in the WSJT-X band activity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplyModifiers(pub u8);

impl ReplyModifiers {
    pub const NONE: u8 = 0x00;
    pub const SHIFT: u8 = 0x02;
    pub const CTRL: u8 = 0x04;
    pub const ALT: u8 = 0x08;
    pub const META: u8 = 0x10;
    pub const KEYPAD: u8 = 0x20;
    pub const GROUP_SWITCH: u8 = 0x40;

    /// Returns `true` if every bit in `flag` is set.
    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }
}

/// REPLY (4): asks WSJT-X to answer a decode, as if it had been double-clicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub id: String,
    pub time: u32,
    pub snr: i32,
    pub delta_time: f64,
    pub delta_frequency: u32,
    pub mode: String,
    pub message: String,
    pub low_confidence: bool,
    pub modifiers: ReplyModifiers,
}

impl ReplyRecord {
    /// Builds a reply that echoes `decode` back to the instance that sent it.
    pub fn from_decode(decode: &DecodeRecord, modifiers: ReplyModifiers) -> Self {
        Self {
            id: decode.id.clone(),
            time: decode.time,
            snr: decode.snr,
            delta_time: decode.delta_time,
            delta_frequency: decode.delta_frequency,
            mode: decode.mode.clone(),
            message: decode.message.clone(),
            low_confidence: decode.low_confidence,
            modifiers,
        }
    }
}

/// CLOSE (6): the sender is shutting down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Close {
    pub id: String,
}

// ── Top-level message ─────────────────────────────────────────────────────────

/// A payload, keyed by the envelope's message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Heartbeat(Heartbeat),
    Decode(DecodeRecord),
    Reply(ReplyRecord),
    Close(Close),
    /// Any type code without a modelled layout.  The payload bytes are kept
    /// verbatim so callers can skip or forward them.  Encoding rejects codes
    /// that have their own variant (see [`MessageType::is_modelled`]).
    Unrecognized { message_type: u32, payload: Vec<u8> },
}

impl Message {
    /// Type code written to the envelope for this message.
    pub fn message_type(&self) -> u32 {
        match self {
            Message::Heartbeat(_) => MessageType::Heartbeat.as_u32(),
            Message::Decode(_) => MessageType::Decode.as_u32(),
            Message::Reply(_) => MessageType::Reply.as_u32(),
            Message::Close(_) => MessageType::Close.as_u32(),
            Message::Unrecognized { message_type, .. } => *message_type,
        }
    }

    /// Sender id, when the payload is one that carries it.
    pub fn id(&self) -> Option<&str> {
        match self {
            Message::Heartbeat(m) => Some(&m.id),
            Message::Decode(m) => Some(&m.id),
            Message::Reply(m) => Some(&m.id),
            Message::Close(m) => Some(&m.id),
            Message::Unrecognized { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_decode() -> DecodeRecord {
        DecodeRecord {
            id: "WSJT-X".to_string(),
            is_new: true,
            time: 120_000,
            snr: -12,
            delta_time: 0.3,
            delta_frequency: 1234,
            mode: "~".to_string(),
            message: "CQ DX K4PI EM73".to_string(),
            low_confidence: true,
            off_air: false,
        }
    }

    #[test]
    fn test_message_type_try_from_covers_all_codes() {
        for code in 0u32..=15 {
            let ty = MessageType::try_from(code).expect("known code");
            assert_eq!(ty.as_u32(), code);
        }
        assert!(MessageType::try_from(16).is_err());
        assert!(MessageType::try_from(u32::MAX).is_err());
    }

    #[test]
    fn test_envelope_new_uses_protocol_constants() {
        let env = Envelope::new(MessageType::Decode);
        assert_eq!(env.magic, MAGIC);
        assert_eq!(env.schema, SCHEMA_VERSION);
        assert_eq!(env.message_type, 2);
        assert_eq!(env.known_type(), Some(MessageType::Decode));
    }

    #[test]
    fn test_envelope_known_type_is_none_for_unknown_code() {
        let env = Envelope {
            magic: MAGIC,
            schema: SCHEMA_VERSION,
            message_type: 99,
        };
        assert_eq!(env.known_type(), None);
    }

    #[test]
    fn test_reply_from_decode_copies_shared_fields() {
        let decode = sample_decode();
        let reply = ReplyRecord::from_decode(&decode, ReplyModifiers(ReplyModifiers::SHIFT));
        assert_eq!(reply.id, decode.id);
        assert_eq!(reply.time, decode.time);
        assert_eq!(reply.snr, decode.snr);
        assert_eq!(reply.delta_time, decode.delta_time);
        assert_eq!(reply.delta_frequency, decode.delta_frequency);
        assert_eq!(reply.mode, decode.mode);
        assert_eq!(reply.message, decode.message);
        assert_eq!(reply.low_confidence, decode.low_confidence);
        assert!(reply.modifiers.contains(ReplyModifiers::SHIFT));
    }

    #[test]
    fn test_modifiers_contains_combined_flags() {
        let m = ReplyModifiers(ReplyModifiers::CTRL | ReplyModifiers::ALT);
        assert!(m.contains(ReplyModifiers::CTRL));
        assert!(m.contains(ReplyModifiers::ALT));
        assert!(m.contains(ReplyModifiers::CTRL | ReplyModifiers::ALT));
        assert!(!m.contains(ReplyModifiers::SHIFT));
        assert!(ReplyModifiers::default().contains(ReplyModifiers::NONE));
    }

    #[test]
    fn test_message_type_codes_per_variant() {
        assert_eq!(Message::Decode(sample_decode()).message_type(), 2);
        assert_eq!(
            Message::Close(Close { id: "x".into() }).message_type(),
            6
        );
        let unknown = Message::Unrecognized {
            message_type: 1,
            payload: vec![],
        };
        assert_eq!(unknown.message_type(), 1);
        assert_eq!(unknown.id(), None);
    }
}
