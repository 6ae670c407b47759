//! Message type bytes carried in the frame header.
//!
//! Types `0x02`..`0x04` are reserved by the runtime protocol; the client core
//! only ever sends `ExecuteRequest` and consumes `ExecuteResponse`.

/// Known message types on the runtime wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Client -> runtime work request.
    ExecuteRequest = 0x00,
    /// Runtime -> client correlated result.
    ExecuteResponse = 0x01,
    /// Reserved: liveness probe.
    HealthCheck = 0x02,
    /// Reserved: liveness probe reply.
    HealthResponse = 0x03,
    /// Reserved: flow-control credit grant.
    CreditUpdate = 0x04,
}

impl MessageType {
    /// Parse a wire byte into a known message type.
    ///
    /// Unknown bytes return `None`; frames carrying them still decode, so a
    /// newer runtime cannot kill the read loop with a type the client does
    /// not recognize.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(MessageType::ExecuteRequest),
            0x01 => Some(MessageType::ExecuteResponse),
            0x02 => Some(MessageType::HealthCheck),
            0x03 => Some(MessageType::HealthResponse),
            0x04 => Some(MessageType::CreditUpdate),
            _ => None,
        }
    }

    /// The wire byte for this message type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            MessageType::ExecuteRequest => "EXECUTE_REQUEST",
            MessageType::ExecuteResponse => "EXECUTE_RESPONSE",
            MessageType::HealthCheck => "HEALTH_CHECK",
            MessageType::HealthResponse => "HEALTH_RESPONSE",
            MessageType::CreditUpdate => "CREDIT_UPDATE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_known_bytes() {
        for byte in 0x00..=0x04u8 {
            let parsed = MessageType::from_u8(byte).unwrap();
            assert_eq!(parsed.as_u8(), byte);
        }
    }

    #[test]
    fn unknown_byte_is_none() {
        assert_eq!(MessageType::from_u8(0x05), None);
        assert_eq!(MessageType::from_u8(0xFF), None);
    }
}
