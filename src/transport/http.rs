//! HTTP transport backed by `reqwest`.
//!
//! This module provides a [`Transport`] implementation that performs
//! real HTTP calls. It is gated behind the `http` feature so the core
//! pipeline stays dependency-light for library embedders.
//!
//! # Classification
//!
//! Any complete HTTP response resolves to `Ok`, whatever the status
//! code. Only failures to obtain a response (timeouts, refused
//! connections, protocol errors) surface as [`TransportError`].

use crate::core::{CallRequest, CallResponse, Transport, TransportError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Whole-request timeout applied by the client.
    pub request_timeout: Duration,

    /// Connection establishment timeout.
    pub connect_timeout: Duration,

    /// User-Agent header value.
    pub user_agent: String,

    /// Bearer token attached to every request (kept secret).
    pub bearer_token: Option<SecretString>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("callguard/", env!("CARGO_PKG_VERSION")).to_string(),
            bearer_token: None,
        }
    }
}

impl HttpTransportConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the whole-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets a bearer token attached to every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(SecretString::new(token.into().into()));
        self
    }
}

/// HTTP transport implementation.
///
/// # Example
///
/// ```rust,ignore
/// use callguard::transport::{HttpTransport, HttpTransportConfig};
/// use std::time::Duration;
///
/// let config = HttpTransportConfig::new()
///     .with_request_timeout(Duration::from_secs(5));
///
/// let transport = HttpTransport::new(config)?;
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    config: HttpTransportConfig,
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a new HTTP transport with the given configuration.
    #[cfg(feature = "http")]
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                TransportError::invalid_request(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    #[cfg(not(feature = "http"))]
    pub fn new(_config: HttpTransportConfig) -> Result<Self, TransportError> {
        Err(TransportError::invalid_request(
            "HTTP transport requires the 'http' feature",
        ))
    }

    /// Creates an HTTP transport with default configuration.
    pub fn with_defaults() -> Result<Self, TransportError> {
        Self::new(HttpTransportConfig::default())
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    #[cfg(feature = "http")]
    fn map_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::timeout(self.config.request_timeout)
        } else if error.is_connect() {
            TransportError::connection_failed(error.to_string())
        } else if error.is_request() || error.is_builder() {
            TransportError::invalid_request(error.to_string())
        } else {
            TransportError::other(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, request: &CallRequest) -> Result<CallResponse, TransportError> {
        #[cfg(feature = "http")]
        {
            use crate::core::HttpMethod;

            let method = match request.method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
                HttpMethod::Put => reqwest::Method::PUT,
                HttpMethod::Patch => reqwest::Method::PATCH,
                HttpMethod::Delete => reqwest::Method::DELETE,
                HttpMethod::Head => reqwest::Method::HEAD,
            };

            let mut builder = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(ref token) = self.config.bearer_token {
                builder = builder.bearer_auth(token.expose_secret());
            }
            if let Some(ref body) = request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().await.map_err(|e| self.map_error(e))?;

            let status = response.status().as_u16();
            let mut headers = std::collections::HashMap::new();
            for (name, value) in response.headers() {
                if let Ok(value) = value.to_str() {
                    headers.insert(name.as_str().to_string(), value.to_string());
                }
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| self.map_error(e))?
                .to_vec();

            Ok(CallResponse {
                status,
                headers,
                body,
            })
        }

        #[cfg(not(feature = "http"))]
        {
            let _ = request;
            Err(TransportError::invalid_request(
                "HTTP transport requires the 'http' feature",
            ))
        }
    }
}
