//! Length-prefixed frame codec for the relaykit runtime protocol.
//!
//! Every message on the wire is framed as:
//! - A 4-byte big-endian length covering the type byte and the payload
//! - A 1-byte message type
//! - The opaque payload bytes
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{decode_frame, encode_frame, Frame, FrameCodec, LENGTH_PREFIX_SIZE, MAX_PAYLOAD};
pub use error::{FrameError, Result};
pub use message::MessageType;
