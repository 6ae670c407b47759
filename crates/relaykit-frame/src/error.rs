/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the protocol maximum.
    ///
    /// On the decode side this is a fatal protocol violation: the declared
    /// length is checked before the body is buffered, and the connection is
    /// aborted.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The frame header declares a length of zero.
    ///
    /// Every frame carries at least the message type byte, so a zero length
    /// means the stream is corrupted.
    #[error("invalid frame length 0 (type byte is mandatory)")]
    EmptyFrame,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
