//! The HTTP connector operation.
//!
//! Builds the JSON sub-payload the `"http"` connector expects
//! (`{method, url, headers?, body?}`) and parses its response
//! (`{status_code, headers, body}`). This JSON schema belongs to the
//! connector, not to the transport core — the envelope still carries it as
//! opaque bytes.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{ExecuteOptions, RuntimeClient};
use crate::error::{ClientError, Result};

/// Connector name for HTTP calls.
pub const HTTP_CONNECTOR: &str = "http";
/// The single operation the HTTP connector exposes.
pub const HTTP_OPERATION: &str = "request";

#[derive(Serialize)]
struct HttpCallPayload<'a> {
    method: &'a str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<&'a HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

#[derive(Deserialize)]
struct HttpResultPayload {
    #[serde(default)]
    status_code: u16,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: String,
}

/// An outbound HTTP request to be executed by the runtime.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
    pub tenant_id: Option<String>,
    pub workspace_id: Option<String>,
    pub trace_id: Option<String>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
            tenant_id: None,
            workspace_id: None,
            trace_id: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new("PUT", url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new("DELETE", url)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_string(value)?;
        Ok(self
            .with_body(body)
            .with_header("Content-Type", "application/json"))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_workspace_id(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

/// The runtime's answer to an HTTP call.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub request_id: u64,
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    /// Runtime-measured execution time in microseconds.
    pub duration_us: u64,
}

impl RuntimeClient {
    /// Execute an HTTP request through the runtime's `"http"` connector.
    pub async fn execute_http(&self, request: HttpRequest) -> Result<HttpResponse> {
        let payload = serde_json::to_vec(&HttpCallPayload {
            method: &request.method,
            url: &request.url,
            headers: (!request.headers.is_empty()).then_some(&request.headers),
            body: request.body.as_deref(),
        })?;

        let options = ExecuteOptions {
            connector_name: HTTP_CONNECTOR.to_string(),
            operation: HTTP_OPERATION.to_string(),
            payload: payload.into(),
            timeout: request.timeout,
            tenant_id: request.tenant_id,
            workspace_id: request.workspace_id,
            trace_id: request.trace_id,
        };

        let response = self.execute(options).await?;
        let request_id = response.request_id;

        if response.payload.is_empty() {
            return Ok(HttpResponse {
                request_id,
                status_code: 0,
                headers: HashMap::new(),
                body: String::new(),
                duration_us: response.duration_us,
            });
        }

        // The call reached the runtime; an uninterpretable result is
        // permanent for this one call.
        let parsed: HttpResultPayload = serde_json::from_slice(&response.payload)
            .map_err(|source| ClientError::ResponseDecode { request_id, source })?;

        Ok(HttpResponse {
            request_id,
            status_code: parsed.status_code,
            headers: parsed.headers,
            body: parsed.body,
            duration_us: response.duration_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_omits_absent_headers_and_body() {
        let request = HttpRequest::get("http://x");
        let json = serde_json::to_value(&HttpCallPayload {
            method: &request.method,
            url: &request.url,
            headers: (!request.headers.is_empty()).then_some(&request.headers),
            body: request.body.as_deref(),
        })
        .unwrap();

        assert_eq!(json["method"], "GET");
        assert_eq!(json["url"], "http://x");
        assert!(json.get("headers").is_none());
        assert!(json.get("body").is_none());
    }

    #[test]
    fn payload_carries_headers_and_body_when_set() {
        let request = HttpRequest::post("http://x")
            .with_header("Authorization", "Bearer t")
            .with_body("hello");
        let json = serde_json::to_value(&HttpCallPayload {
            method: &request.method,
            url: &request.url,
            headers: (!request.headers.is_empty()).then_some(&request.headers),
            body: request.body.as_deref(),
        })
        .unwrap();

        assert_eq!(json["method"], "POST");
        assert_eq!(json["headers"]["Authorization"], "Bearer t");
        assert_eq!(json["body"], "hello");
    }

    #[test]
    fn with_json_sets_body_and_content_type() {
        let request = HttpRequest::post("http://x")
            .with_json(&serde_json::json!({"k": 1}))
            .unwrap();

        assert_eq!(request.body.as_deref(), Some(r#"{"k":1}"#));
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn result_payload_parses_with_defaults() {
        let parsed: HttpResultPayload =
            serde_json::from_str(r#"{"status_code":200,"body":"ok"}"#).unwrap();
        assert_eq!(parsed.status_code, 200);
        assert_eq!(parsed.body, "ok");
        assert!(parsed.headers.is_empty());
    }
}
