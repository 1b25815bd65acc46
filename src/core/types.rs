//! Core types used throughout the callguard library.
//!
//! This module defines the fundamental data structures for representing
//! outbound calls: the request being made, the response that came back,
//! and the caller-supplied context that travels with an execution.
//!
//! The types are self-contained on purpose. The pipeline never depends on
//! a concrete HTTP client; adapters translate these shapes at the edge.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// HTTP method for an outbound call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request.
    #[default]
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
    /// HEAD request.
    Head,
}

impl HttpMethod {
    /// Returns the canonical uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An outbound request as the pipeline sees it.
///
/// One `CallRequest` describes the call; the transport performs it, once
/// per attempt. The pipeline treats the request as immutable and reuses it
/// verbatim for every retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// HTTP method.
    pub method: HttpMethod,

    /// Absolute URL of the upstream endpoint.
    pub url: String,

    /// Request headers as key-value pairs.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Optional request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
}

impl CallRequest {
    /// Creates a new request with the given method and URL.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl fmt::Display for CallRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A well-formed response from one transport attempt.
///
/// "Well-formed" means the transport got a complete answer back; it says
/// nothing about whether the answer is good. Only the outcome classifier
/// decides that, so a 500 here is still a response, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response headers as key-value pairs.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Response body bytes.
    #[serde(default)]
    pub body: Vec<u8>,
}

impl CallResponse {
    /// Creates a response with the given status and no body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a 200 OK response.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::new(404)
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the response body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` for 4xx statuses.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Returns `true` for 5xx statuses.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Returns a short human-readable label for the status code.
    pub fn status_label(&self) -> &'static str {
        match self.status {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

impl fmt::Display for CallResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.status_label())
    }
}

/// Context information for a pipeline execution.
///
/// This carries metadata about who is making the call and why, useful for
/// fallback decisions and telemetry. The pipeline passes it through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallContext {
    /// Correlation ID for tracing across services.
    pub correlation_id: Option<String>,

    /// Identifier of the calling component or tenant.
    pub caller: Option<String>,

    /// Source of the call (e.g., "api", "scheduler", "backfill").
    pub source: Option<String>,

    /// Additional custom metadata as key-value pairs.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CallContext {
    /// Creates a new empty call context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the correlation ID.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Sets the caller identifier.
    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    /// Sets the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a custom metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }

    #[test]
    fn test_call_request_builder() {
        let request = CallRequest::get("https://api.example.com/items")
            .with_header("accept", "application/json")
            .with_body(r#"{"q":"all"}"#);

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.headers.get("accept"), Some(&"application/json".to_string()));
        assert!(request.body.is_some());
        assert_eq!(request.to_string(), "GET https://api.example.com/items");
    }

    #[test]
    fn test_call_response_status_classes() {
        assert!(CallResponse::ok().is_success());
        assert!(CallResponse::not_found().is_client_error());
        assert!(CallResponse::new(503).is_server_error());
        assert!(!CallResponse::new(503).is_success());
    }

    #[test]
    fn test_call_response_status_label() {
        assert_eq!(CallResponse::ok().status_label(), "OK");
        assert_eq!(CallResponse::not_found().status_label(), "Not Found");
        assert_eq!(CallResponse::new(418).status_label(), "Unknown");
    }

    #[test]
    fn test_call_response_body_text() {
        let response = CallResponse::ok().with_body("hello");
        assert_eq!(response.body_text(), "hello");
        assert_eq!(response.to_string(), "200 OK");
    }

    #[test]
    fn test_call_context_builder() {
        let ctx = CallContext::new()
            .with_correlation_id("req-7f3a")
            .with_caller("billing")
            .with_metadata("env", "production");

        assert_eq!(ctx.correlation_id, Some("req-7f3a".into()));
        assert_eq!(ctx.caller, Some("billing".into()));
        assert_eq!(ctx.metadata.get("env"), Some(&"production".to_string()));
    }
}
