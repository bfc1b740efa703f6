//! Protocol module containing the gesture message type and its JSON codec.

pub mod codec;
pub mod messages;

pub use codec::{decode, encode, encode_message, CodecError};
pub use messages::{GestureMessage, GesturePhase};
