use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::{FrameError, Result};
use crate::message::MessageType;

/// Size of the big-endian length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of the message type byte covered by the length prefix.
const TYPE_SIZE: usize = 1;

/// Maximum payload size: 10 MiB. Protocol constant, not user-configurable.
pub const MAX_PAYLOAD: usize = 10 * 1024 * 1024;

/// One length-prefixed unit on the wire.
///
/// The message type is kept as the raw byte so frames with reserved or
/// future types survive decoding; [`Frame::kind`] resolves the known ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The raw message type byte.
    pub message_type: u8,
    /// The opaque payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame for a known message type.
    pub fn new(message_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self {
            message_type: message_type.as_u8(),
            payload: payload.into(),
        }
    }

    /// Resolve the message type byte, if it is a known type.
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_u8(self.message_type)
    }

    /// The total wire size of this frame (prefix + type + payload).
    pub fn wire_size(&self) -> usize {
        LENGTH_PREFIX_SIZE + TYPE_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────────┬─────────────┬──────────────────┐
/// │ Length      │ Type (1B)   │ Payload          │
/// │ (4B BE)     │             │ (Length-1 bytes) │
/// └─────────────┴─────────────┴──────────────────┘
/// ```
/// The length covers the type byte and the payload, excluding itself.
pub fn encode_frame(message_type: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(LENGTH_PREFIX_SIZE + TYPE_SIZE + payload.len());
    dst.put_u32((TYPE_SIZE + payload.len()) as u32);
    dst.put_u8(message_type);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
///
/// The declared length is validated against [`MAX_PAYLOAD`] as soon as the
/// four prefix bytes are available, so a corrupted length can never make the
/// decoder buffer unbounded amounts of data.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None); // Need more data
    }

    let declared = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

    if declared < TYPE_SIZE {
        return Err(FrameError::EmptyFrame);
    }

    let payload_len = declared - TYPE_SIZE;
    if payload_len > MAX_PAYLOAD {
        warn!(declared, max = MAX_PAYLOAD, "oversized frame, aborting");
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: MAX_PAYLOAD,
        });
    }

    let total = LENGTH_PREFIX_SIZE + declared;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None); // Need more data
    }

    src.advance(LENGTH_PREFIX_SIZE);
    let message_type = src.get_u8();
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame {
        message_type,
        payload,
    }))
}

/// `tokio_util` codec over the frame wire format.
///
/// Plug into `FramedRead`/`FramedWrite` to get a stream/sink of [`Frame`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        decode_frame(src)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        encode_frame(frame.message_type, frame.payload.as_ref(), dst)
    }
}
