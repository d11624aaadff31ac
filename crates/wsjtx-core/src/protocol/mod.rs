//! Protocol module containing message types, the primitive cursor and the codec.

pub mod codec;
pub mod messages;
pub mod primitives;

pub use codec::{
    decode_message, encode_message, read_payload, write_payload, ProtocolError, WireFormat,
};
pub use messages::*;
pub use primitives::{WireReader, WireWriter};
