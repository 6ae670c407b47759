use std::time::Duration;

use relaykit_frame::FrameError;
use relaykit_transport::TransportError;
use relaykit_wire::{ErrorClass, WireError};

/// Errors surfaced to callers of the client.
///
/// Every failure can be classified via [`ClientError::error_class`] so retry
/// policies can treat local and runtime-reported failures uniformly, and
/// failures tied to a specific call carry its request ID.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The connection could not be established or broke at the stream level.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level protocol violation (oversized or malformed frame).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The request envelope could not be encoded, or a decoded envelope was
    /// malformed.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// The connector payload could not be serialized. Caller error.
    #[error("invalid request payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The request frame for this call could not be written to the stream.
    /// The call never reached the runtime; its table entry is already gone.
    #[error("failed to send request {request_id}: {source}")]
    SendFailed {
        request_id: u64,
        source: FrameError,
    },

    /// The runtime reported a non-success outcome for this call.
    #[error("[{class}] {message} (request_id: {request_id})")]
    Runtime {
        request_id: u64,
        class: ErrorClass,
        message: String,
    },

    /// The local deadline elapsed before a response arrived.
    #[error("request {request_id} timed out after {after:?}")]
    Timeout { request_id: u64, after: Duration },

    /// The connection dropped while this call was in flight. Its fate is
    /// unknown — the runtime may or may not have executed the work.
    #[error("connection lost with request {request_id} in flight")]
    ConnectionLost { request_id: u64 },

    /// The client has been closed; no new calls are accepted.
    #[error("client is closed")]
    Closed,

    /// The call reached the runtime, but its response payload could not be
    /// interpreted. Retrying would yield the same uninterpretable result.
    #[error("undecodable response payload for request {request_id}: {source}")]
    ResponseDecode {
        request_id: u64,
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Classify this failure into the closed runtime taxonomy.
    ///
    /// Protocol-level failures (frame violations, connection drops) are
    /// `Transient`: the work's completion status is unknown. A response
    /// payload that decodes to garbage is `Permanent` for that one call.
    pub fn error_class(&self) -> ErrorClass {
        match self {
            ClientError::Transport(_)
            | ClientError::Frame(_)
            | ClientError::Wire(_)
            | ClientError::SendFailed { .. }
            | ClientError::ConnectionLost { .. }
            | ClientError::Closed => ErrorClass::Transient,
            ClientError::InvalidPayload(_) => ErrorClass::InvalidRequest,
            ClientError::Timeout { .. } => ErrorClass::Timeout,
            ClientError::ResponseDecode { .. } => ErrorClass::Permanent,
            ClientError::Runtime { class, .. } => *class,
        }
    }

    /// Whether the failed call may be retried, per the class taxonomy.
    pub fn is_retryable(&self) -> bool {
        self.error_class().is_retryable()
    }

    /// The request ID of the failed call, when the failure is tied to one.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ClientError::Runtime { request_id, .. }
            | ClientError::SendFailed { request_id, .. }
            | ClientError::Timeout { request_id, .. }
            | ClientError::ConnectionLost { request_id }
            | ClientError::ResponseDecode { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
