//! The closed error taxonomy reported by the runtime.

use crate::error::{Result, WireError};

/// Outcome classification for a runtime-executed call.
///
/// This is the contract every retry policy built atop the client must honor:
/// [`ErrorClass::is_retryable`] is a pure lookup with no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorClass {
    /// The call completed; not an error.
    Success = 0,
    /// Safe to retry as-is (the call's fate is unknown or the failure was
    /// momentary).
    Transient = 1,
    /// Do not retry; the failure will repeat.
    Permanent = 2,
    /// Retry after backoff.
    RateLimited = 3,
    /// The deadline elapsed, locally or upstream.
    Timeout = 4,
    /// Caller error; do not retry.
    InvalidRequest = 5,
}

impl ErrorClass {
    /// Parse the wire byte. Anything outside `0..=5` is a decode error —
    /// the taxonomy is closed.
    pub fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(ErrorClass::Success),
            1 => Ok(ErrorClass::Transient),
            2 => Ok(ErrorClass::Permanent),
            3 => Ok(ErrorClass::RateLimited),
            4 => Ok(ErrorClass::Timeout),
            5 => Ok(ErrorClass::InvalidRequest),
            other => Err(WireError::UnknownErrorClass(other)),
        }
    }

    /// The wire byte for this class.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether a call failing with this class may be retried.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorClass::Transient | ErrorClass::RateLimited | ErrorClass::Timeout
        )
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorClass::Success => "SUCCESS",
            ErrorClass::Transient => "TRANSIENT",
            ErrorClass::Permanent => "PERMANENT",
            ErrorClass::RateLimited => "RATE_LIMITED",
            ErrorClass::Timeout => "TIMEOUT",
            ErrorClass::InvalidRequest => "INVALID_REQUEST",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_bytes_roundtrip() {
        for byte in 0..=5u8 {
            assert_eq!(ErrorClass::from_u8(byte).unwrap().as_u8(), byte);
        }
    }

    #[test]
    fn out_of_range_byte_rejected() {
        assert!(matches!(
            ErrorClass::from_u8(6),
            Err(WireError::UnknownErrorClass(6))
        ));
    }

    #[test]
    fn retryability_is_exactly_the_three_classes() {
        assert!(ErrorClass::Transient.is_retryable());
        assert!(ErrorClass::RateLimited.is_retryable());
        assert!(ErrorClass::Timeout.is_retryable());

        assert!(!ErrorClass::Success.is_retryable());
        assert!(!ErrorClass::Permanent.is_retryable());
        assert!(!ErrorClass::InvalidRequest.is_retryable());
    }
}
