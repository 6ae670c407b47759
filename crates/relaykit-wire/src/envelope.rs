use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::class::ErrorClass;
use crate::error::{Result, WireError};

/// Size of a field header: tag byte plus big-endian u32 value length.
const FIELD_HEADER_SIZE: usize = 5;

// ExecuteRequest field tags.
mod req {
    pub const REQUEST_ID: u8 = 0x01;
    pub const TENANT_ID: u8 = 0x02;
    pub const WORKSPACE_ID: u8 = 0x03;
    pub const TRACE_ID: u8 = 0x04;
    pub const CONNECTOR_NAME: u8 = 0x05;
    pub const OPERATION: u8 = 0x06;
    pub const DEADLINE_AT_MS: u8 = 0x07;
    pub const PAYLOAD: u8 = 0x08;
}

// ExecuteResponse field tags.
mod resp {
    pub const REQUEST_ID: u8 = 0x01;
    pub const ERROR_CLASS: u8 = 0x02;
    pub const ERROR_MESSAGE: u8 = 0x03;
    pub const PAYLOAD: u8 = 0x04;
    pub const DURATION_US: u8 = 0x05;
}

/// A logical call packed for the runtime.
///
/// `workspace_id` and `trace_id` are omitted from the wire entirely when
/// unset, so the runtime can distinguish "not provided" from "empty".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub request_id: u64,
    pub tenant_id: String,
    pub workspace_id: Option<String>,
    pub trace_id: Option<String>,
    pub connector_name: String,
    pub operation: String,
    /// Absolute wall-clock deadline in milliseconds since the Unix epoch.
    /// The runtime uses it for cooperative cancellation upstream.
    pub deadline_at_ms: u64,
    /// Opaque connector-specific payload. Never inspected at this layer.
    pub payload: Bytes,
}

impl ExecuteRequest {
    /// Encode into the tagged binary table format.
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.encoded_size_hint());
        put_u64(&mut dst, req::REQUEST_ID, self.request_id);
        put_str(&mut dst, req::TENANT_ID, &self.tenant_id);
        if let Some(workspace_id) = &self.workspace_id {
            put_str(&mut dst, req::WORKSPACE_ID, workspace_id);
        }
        if let Some(trace_id) = &self.trace_id {
            put_str(&mut dst, req::TRACE_ID, trace_id);
        }
        put_str(&mut dst, req::CONNECTOR_NAME, &self.connector_name);
        put_str(&mut dst, req::OPERATION, &self.operation);
        put_u64(&mut dst, req::DEADLINE_AT_MS, self.deadline_at_ms);
        put_bytes(&mut dst, req::PAYLOAD, &self.payload);
        dst.freeze()
    }

    /// Decode from the tagged binary table format.
    pub fn decode(mut src: Bytes) -> Result<Self> {
        let mut request_id = None;
        let mut tenant_id = None;
        let mut workspace_id = None;
        let mut trace_id = None;
        let mut connector_name = None;
        let mut operation = None;
        let mut deadline_at_ms = None;
        let mut payload = None;

        while let Some((tag, value)) = next_field(&mut src)? {
            match tag {
                req::REQUEST_ID => request_id = Some(get_u64("request_id", &value)?),
                req::TENANT_ID => tenant_id = Some(get_str("tenant_id", &value)?),
                req::WORKSPACE_ID => workspace_id = Some(get_str("workspace_id", &value)?),
                req::TRACE_ID => trace_id = Some(get_str("trace_id", &value)?),
                req::CONNECTOR_NAME => connector_name = Some(get_str("connector_name", &value)?),
                req::OPERATION => operation = Some(get_str("operation", &value)?),
                req::DEADLINE_AT_MS => deadline_at_ms = Some(get_u64("deadline_at_ms", &value)?),
                req::PAYLOAD => payload = Some(value),
                other => trace!(tag = other, "skipping unknown request field"),
            }
        }

        Ok(Self {
            request_id: request_id.ok_or(WireError::MissingField("request_id"))?,
            tenant_id: tenant_id.ok_or(WireError::MissingField("tenant_id"))?,
            workspace_id,
            trace_id,
            connector_name: connector_name.ok_or(WireError::MissingField("connector_name"))?,
            operation: operation.ok_or(WireError::MissingField("operation"))?,
            deadline_at_ms: deadline_at_ms.ok_or(WireError::MissingField("deadline_at_ms"))?,
            payload: payload.ok_or(WireError::MissingField("payload"))?,
        })
    }

    fn encoded_size_hint(&self) -> usize {
        8 * FIELD_HEADER_SIZE
            + 16
            + self.tenant_id.len()
            + self.workspace_id.as_deref().map_or(0, str::len)
            + self.trace_id.as_deref().map_or(0, str::len)
            + self.connector_name.len()
            + self.operation.len()
            + self.payload.len()
    }
}

/// A correlated result from the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteResponse {
    pub request_id: u64,
    pub error_class: ErrorClass,
    pub error_message: Option<String>,
    /// Opaque connector-specific payload (for HTTP, the status/headers/body
    /// JSON object). Never inspected at this layer.
    pub payload: Bytes,
    /// Runtime-measured execution time in microseconds.
    pub duration_us: u64,
}

impl ExecuteResponse {
    /// Encode into the tagged binary table format.
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(
            5 * FIELD_HEADER_SIZE
                + 17
                + self.error_message.as_deref().map_or(0, str::len)
                + self.payload.len(),
        );
        put_u64(&mut dst, resp::REQUEST_ID, self.request_id);
        put_bytes(&mut dst, resp::ERROR_CLASS, &[self.error_class.as_u8()]);
        if let Some(message) = &self.error_message {
            put_str(&mut dst, resp::ERROR_MESSAGE, message);
        }
        put_bytes(&mut dst, resp::PAYLOAD, &self.payload);
        put_u64(&mut dst, resp::DURATION_US, self.duration_us);
        dst.freeze()
    }

    /// Decode from the tagged binary table format.
    pub fn decode(mut src: Bytes) -> Result<Self> {
        let mut request_id = None;
        let mut error_class = None;
        let mut error_message = None;
        let mut payload = None;
        let mut duration_us = None;

        while let Some((tag, value)) = next_field(&mut src)? {
            match tag {
                resp::REQUEST_ID => request_id = Some(get_u64("request_id", &value)?),
                resp::ERROR_CLASS => {
                    if value.len() != 1 {
                        return Err(WireError::InvalidFieldLength {
                            field: "error_class",
                            expected: 1,
                            actual: value.len(),
                        });
                    }
                    error_class = Some(ErrorClass::from_u8(value[0])?);
                }
                resp::ERROR_MESSAGE => error_message = Some(get_str("error_message", &value)?),
                resp::PAYLOAD => payload = Some(value),
                resp::DURATION_US => duration_us = Some(get_u64("duration_us", &value)?),
                other => trace!(tag = other, "skipping unknown response field"),
            }
        }

        Ok(Self {
            request_id: request_id.ok_or(WireError::MissingField("request_id"))?,
            error_class: error_class.ok_or(WireError::MissingField("error_class"))?,
            error_message,
            payload: payload.ok_or(WireError::MissingField("payload"))?,
            duration_us: duration_us.ok_or(WireError::MissingField("duration_us"))?,
        })
    }
}

fn put_u64(dst: &mut BytesMut, tag: u8, value: u64) {
    dst.put_u8(tag);
    dst.put_u32(8);
    dst.put_u64(value);
}

fn put_str(dst: &mut BytesMut, tag: u8, value: &str) {
    put_bytes(dst, tag, value.as_bytes());
}

fn put_bytes(dst: &mut BytesMut, tag: u8, value: &[u8]) {
    dst.put_u8(tag);
    dst.put_u32(value.len() as u32);
    dst.put_slice(value);
}

/// Pull the next `(tag, value)` pair off the table, or `None` at the end.
fn next_field(src: &mut Bytes) -> Result<Option<(u8, Bytes)>> {
    if !src.has_remaining() {
        return Ok(None);
    }
    if src.remaining() < FIELD_HEADER_SIZE {
        return Err(WireError::Truncated);
    }
    let tag = src.get_u8();
    let len = src.get_u32() as usize;
    if src.remaining() < len {
        return Err(WireError::Truncated);
    }
    Ok(Some((tag, src.split_to(len))))
}

fn get_u64(field: &'static str, value: &Bytes) -> Result<u64> {
    let bytes: [u8; 8] = value
        .as_ref()
        .try_into()
        .map_err(|_| WireError::InvalidFieldLength {
            field,
            expected: 8,
            actual: value.len(),
        })?;
    Ok(u64::from_be_bytes(bytes))
}

fn get_str(field: &'static str, value: &Bytes) -> Result<String> {
    let s = std::str::from_utf8(value.as_ref())
        .map_err(|source| WireError::InvalidUtf8 { field, source })?;
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> ExecuteRequest {
        ExecuteRequest {
            request_id: 42,
            tenant_id: "acme".to_string(),
            workspace_id: Some("ws-7".to_string()),
            trace_id: Some("trace-abc".to_string()),
            connector_name: "http".to_string(),
            operation: "request".to_string(),
            deadline_at_ms: 1_900_000_000_000,
            payload: Bytes::from_static(br#"{"method":"GET","url":"http://x"}"#),
        }
    }

    #[test]
    fn request_roundtrip_all_fields() {
        let request = sample_request();
        let decoded = ExecuteRequest::decode(request.encode()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn absent_optionals_decode_as_absent() {
        let request = ExecuteRequest {
            workspace_id: None,
            trace_id: None,
            ..sample_request()
        };
        let decoded = ExecuteRequest::decode(request.encode()).unwrap();
        assert_eq!(decoded.workspace_id, None);
        assert_eq!(decoded.trace_id, None);
    }

    #[test]
    fn empty_string_is_distinct_from_absent() {
        let request = ExecuteRequest {
            workspace_id: Some(String::new()),
            ..sample_request()
        };
        let decoded = ExecuteRequest::decode(request.encode()).unwrap();
        assert_eq!(decoded.workspace_id, Some(String::new()));
    }

    #[test]
    fn missing_required_field_rejected() {
        // Encode, then strip the tenant_id field by re-encoding without it.
        let request = sample_request();
        let mut dst = BytesMut::new();
        put_u64(&mut dst, req::REQUEST_ID, request.request_id);
        put_str(&mut dst, req::CONNECTOR_NAME, &request.connector_name);
        put_str(&mut dst, req::OPERATION, &request.operation);
        put_u64(&mut dst, req::DEADLINE_AT_MS, request.deadline_at_ms);
        put_bytes(&mut dst, req::PAYLOAD, &request.payload);

        let err = ExecuteRequest::decode(dst.freeze()).unwrap_err();
        assert!(matches!(err, WireError::MissingField("tenant_id")));
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let mut dst = BytesMut::new();
        put_bytes(&mut dst, 0x7E, b"from-a-newer-runtime");
        dst.extend_from_slice(&sample_request().encode());
        put_bytes(&mut dst, 0x7F, b"");

        let decoded = ExecuteRequest::decode(dst.freeze()).unwrap();
        assert_eq!(decoded, sample_request());
    }

    #[test]
    fn truncated_table_rejected() {
        let encoded = sample_request().encode();
        let truncated = encoded.slice(..encoded.len() - 3);
        let err = ExecuteRequest::decode(truncated).unwrap_err();
        assert!(matches!(err, WireError::Truncated));
    }

    #[test]
    fn scalar_with_wrong_length_rejected() {
        let mut dst = BytesMut::new();
        put_bytes(&mut dst, req::REQUEST_ID, &[0x01, 0x02]);
        let err = ExecuteRequest::decode(dst.freeze()).unwrap_err();
        assert!(matches!(
            err,
            WireError::InvalidFieldLength {
                field: "request_id",
                ..
            }
        ));
    }

    #[test]
    fn response_roundtrip_success() {
        let response = ExecuteResponse {
            request_id: 42,
            error_class: ErrorClass::Success,
            error_message: None,
            payload: Bytes::from_static(br#"{"status_code":200,"body":"ok"}"#),
            duration_us: 1534,
        };
        let decoded = ExecuteResponse::decode(response.encode()).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn response_roundtrip_error_with_message() {
        let response = ExecuteResponse {
            request_id: 7,
            error_class: ErrorClass::RateLimited,
            error_message: Some("quota exceeded".to_string()),
            payload: Bytes::new(),
            duration_us: 88,
        };
        let decoded = ExecuteResponse::decode(response.encode()).unwrap();
        assert_eq!(decoded.error_message.as_deref(), Some("quota exceeded"));
        assert_eq!(decoded, response);
    }

    #[test]
    fn response_unknown_error_class_rejected() {
        let mut dst = BytesMut::new();
        put_u64(&mut dst, resp::REQUEST_ID, 1);
        put_bytes(&mut dst, resp::ERROR_CLASS, &[9]);
        put_bytes(&mut dst, resp::PAYLOAD, b"");
        put_u64(&mut dst, resp::DURATION_US, 0);

        let err = ExecuteResponse::decode(dst.freeze()).unwrap_err();
        assert!(matches!(err, WireError::UnknownErrorClass(9)));
    }

    #[test]
    fn response_empty_payload_is_valid() {
        let response = ExecuteResponse {
            request_id: 3,
            error_class: ErrorClass::Timeout,
            error_message: Some("deadline elapsed".to_string()),
            payload: Bytes::new(),
            duration_us: 0,
        };
        let decoded = ExecuteResponse::decode(response.encode()).unwrap();
        assert!(decoded.payload.is_empty());
    }
}
