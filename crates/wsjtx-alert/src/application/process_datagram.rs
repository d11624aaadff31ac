//! ProcessDatagramUseCase: turns one received datagram into alerts and replies.
//!
//! The flow for every datagram is:
//!
//! 1. Read the 12-byte envelope.
//! 2. Apply the [`EnvelopePolicy`]: wrong magic or schema means "not for us".
//! 3. Dispatch on the message type.  Only DECODE is handled; anything else is
//!    skipped without reading further, because its layout is type-dependent.
//! 4. Read the [`DecodeRecord`], evaluate the prefix rules on its text, and
//!    notify the [`AlertSink`] once per hit.
//! 5. Optionally build an encoded REPLY for the sender when a callsign hit.
//!
//! # Architecture
//!
//! This use case depends only on the [`AlertSink`] trait and domain rules.
//! The socket lives in `infrastructure::network::listener`, which feeds
//! datagrams in and sends the returned reply bytes back out.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use wsjtx_core::protocol::messages::{MAGIC, SCHEMA_VERSION};
use wsjtx_core::{
    encode_message, DecodeRecord, Envelope, Message, MessageType, ProtocolError, ReplyModifiers,
    ReplyRecord, WireFormat, WireReader,
};

use crate::domain::rules::{evaluate, AlertMatch, PrefixRules};

/// Error type for the process-datagram use case.
#[derive(Debug, Error, PartialEq)]
pub enum ProcessError {
    /// Magic or schema did not match the policy.  Not fatal: the datagram is
    /// simply not addressed to this application.
    #[error("envelope mismatch: magic 0x{magic:08X}, schema {schema}")]
    EnvelopeMismatch { magic: u32, schema: u32 },

    /// The envelope or payload could not be decoded.
    #[error("malformed datagram: {0}")]
    Decode(#[from] ProtocolError),
}

/// Side effect triggered for each rule hit.
///
/// The infrastructure implementation rings the terminal bell; tests record calls.
#[cfg_attr(test, mockall::automock)]
pub trait AlertSink: Send + Sync {
    fn alert(&self, hit: &AlertMatch);
}

/// Which envelopes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopePolicy {
    pub magic: u32,
    pub schema: u32,
}

impl Default for EnvelopePolicy {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            schema: SCHEMA_VERSION,
        }
    }
}

impl EnvelopePolicy {
    /// # Errors
    ///
    /// Returns [`ProcessError::EnvelopeMismatch`] when magic or schema differ.
    pub fn check(&self, envelope: &Envelope) -> Result<(), ProcessError> {
        if envelope.magic != self.magic || envelope.schema != self.schema {
            return Err(ProcessError::EnvelopeMismatch {
                magic: envelope.magic,
                schema: envelope.schema,
            });
        }
        Ok(())
    }
}

/// Result of processing one datagram that passed the envelope policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A DECODE was read and evaluated.
    Decoded {
        decode: DecodeRecord,
        matches: Vec<AlertMatch>,
        /// Encoded REPLY datagram to send back to the source, if any.
        reply: Option<Vec<u8>>,
    },
    /// The message type is not handled; its payload was not read.
    Skipped { message_type: u32 },
}

/// Use case that decodes datagrams and drives alerts.
pub struct DatagramProcessor {
    rules: PrefixRules,
    policy: EnvelopePolicy,
    reply_on_match: bool,
    sink: Arc<dyn AlertSink>,
}

impl DatagramProcessor {
    /// Creates a processor with the default envelope policy.
    pub fn new(rules: PrefixRules, reply_on_match: bool, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            rules,
            policy: EnvelopePolicy::default(),
            reply_on_match,
            sink,
        }
    }

    /// Replaces the envelope policy.
    pub fn with_policy(mut self, policy: EnvelopePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn rules(&self) -> &PrefixRules {
        &self.rules
    }

    /// Processes one complete datagram.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::EnvelopeMismatch`] for foreign datagrams and
    /// [`ProcessError::Decode`] for truncated or malformed ones.  In both
    /// cases no alert has fired and the datagram should be dropped.
    pub fn process(&self, datagram: &[u8]) -> Result<Outcome, ProcessError> {
        let mut reader = WireReader::new(datagram);
        let envelope = Envelope::read_from(&mut reader)?;
        self.policy.check(&envelope)?;

        if envelope.message_type != MessageType::Decode.as_u32() {
            return Ok(Outcome::Skipped {
                message_type: envelope.message_type,
            });
        }

        let decode = DecodeRecord::read_from(&mut reader)?;
        let matches = evaluate(&decode.message, &self.rules);
        for hit in &matches {
            warn!("{hit} ({})", decode.message);
            self.sink.alert(hit);
        }

        let reply = if self.reply_on_match && matches.iter().any(AlertMatch::is_callsign) {
            let reply = ReplyRecord::from_decode(&decode, ReplyModifiers::default());
            Some(encode_message(&Message::Reply(reply))?)
        } else {
            None
        };

        Ok(Outcome::Decoded {
            decode,
            matches,
            reply,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
