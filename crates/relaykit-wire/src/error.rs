/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A required field is missing from the decoded table.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field value has the wrong size for its type.
    #[error("invalid field `{field}`: expected {expected} bytes, got {actual}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A string field is not valid UTF-8.
    #[error("field `{field}` is not valid UTF-8")]
    InvalidUtf8 {
        field: &'static str,
        source: std::str::Utf8Error,
    },

    /// The error class byte is outside the closed `0..=5` range.
    #[error("unknown error class byte {0:#04x}")]
    UnknownErrorClass(u8),

    /// The table ends in the middle of a field header or value.
    #[error("truncated envelope (field header or value cut short)")]
    Truncated,
}

pub type Result<T> = std::result::Result<T, WireError>;
