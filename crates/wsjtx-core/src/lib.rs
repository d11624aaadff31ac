//! # wsjtx-core
//!
//! Codec for the UDP message protocol spoken by WSJT-X and compatible
//! weak-signal digital mode programs.
//!
//! This crate has no dependencies on sockets, files or OS APIs.  It only turns
//! bytes into typed messages and back.
//!
//! # Architecture overview (for beginners)
//!
//! WSJT-X broadcasts what it hears (one UDP datagram per decoded signal) and
//! accepts a few commands back.  Every datagram has the same shape:
//!
//! - a 12-byte **envelope**: magic number, schema number, message type;
//! - a **payload** whose fields depend on the message type.
//!
//! The crate is split the same way:
//!
//! - **`protocol::primitives`** – [`WireReader`] / [`WireWriter`], forward-only
//!   cursors that encode the scalar wire types (big-endian integers, doubles,
//!   one-byte booleans and length-prefixed UTF-8 strings).
//!
//! - **`protocol::messages`** – the envelope, the payload records
//!   ([`DecodeRecord`], [`ReplyRecord`], ...) and the [`Message`] sum type.
//!
//! - **`protocol::codec`** – the [`WireFormat`] trait that reads and writes each
//!   record in its fixed field order, plus whole-datagram helpers.
//!
//! There is no resynchronisation marker in this protocol.  Any failure aborts
//! the current datagram; the caller drops it and waits for the next one.

pub mod protocol;

pub use protocol::{
    decode_message, encode_message, DecodeRecord, Envelope, Message, MessageType,
    ProtocolError, ReplyModifiers, ReplyRecord, WireFormat, WireReader, WireWriter,
};
