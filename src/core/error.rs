//! Error types for the callguard library.
//!
//! This module provides structured, typed errors for all failure scenarios.
//! The library never panics; all errors are returned as `Result` values.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by a [`Transport`](crate::core::Transport) attempt.
///
/// These describe what went wrong while trying to reach the upstream
/// service. Whether a given variant is treated as a handled failure or
/// passed through untouched is decided by the outcome classifier, not here.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The attempt did not complete within its deadline.
    #[error("call timed out after {elapsed:?}")]
    Timeout {
        /// How long the attempt ran before timing out.
        elapsed: Duration,
    },

    /// The connection to the upstream could not be established.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        /// Error message describing the failure.
        message: String,
    },

    /// Hostname resolution failed.
    #[error("DNS resolution failed for host '{host}'")]
    Dns {
        /// The host that could not be resolved.
        host: String,
    },

    /// TLS negotiation with the upstream failed.
    #[error("TLS error: {message}")]
    Tls {
        /// Details about the TLS failure.
        message: String,
    },

    /// The request could not be constructed or sent.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// What is wrong with the request.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A transport failure that fits no other variant.
    #[error("transport error: {message}")]
    Other {
        /// Description of the failure.
        message: String,
    },
}

impl TransportError {
    /// Returns `true` if this error describes a failure to reach the
    /// upstream at all (as opposed to a malformed request on our side).
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionFailed { .. }
                | Self::Dns { .. }
                | Self::Tls { .. }
                | Self::Io(_)
        )
    }

    /// Returns `true` if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Creates a `Timeout` error.
    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout { elapsed }
    }

    /// Creates a `ConnectionFailed` error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Creates a `Dns` error.
    pub fn dns(host: impl Into<String>) -> Self {
        Self::Dns { host: host.into() }
    }

    /// Creates a `Tls` error.
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls {
            message: message.into(),
        }
    }

    /// Creates an `InvalidRequest` error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Creates an `Other` error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Terminal errors from pipeline execution.
///
/// [`CallPipeline::execute`](crate::pipeline::CallPipeline::execute) absorbs
/// ordinary call failures into the fallback path; an error here means the
/// pipeline itself is broken and retrying cannot help.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The fallback provider itself failed.
    ///
    /// The fallback is the last line of defense; if it cannot produce a
    /// response the pipeline is misconfigured. This is never retried and
    /// never counted against the circuit breaker.
    #[error("fallback provider failed ({trigger}): {message}")]
    FallbackFailed {
        /// Description of the provider failure.
        message: String,
        /// What the fallback was trying to substitute for.
        trigger: String,
    },

    /// The pipeline was constructed with invalid configuration.
    #[error("invalid pipeline configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration problem.
        message: String,
    },
}

impl PipelineError {
    /// Returns `true` if this error indicates a broken fallback provider.
    pub fn is_fallback_failure(&self) -> bool {
        matches!(self, Self::FallbackFailed { .. })
    }

    /// Creates a `FallbackFailed` error.
    pub fn fallback_failed(message: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self::FallbackFailed {
            message: message.into(),
            trigger: trigger.into(),
        }
    }

    /// Creates an `InvalidConfig` error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for transport attempts.
pub type TransportResult<T> = Result<T, TransportError>;

/// A specialized `Result` type for pipeline execution.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_is_connectivity() {
        let timeout = TransportError::timeout(Duration::from_secs(30));
        assert!(timeout.is_connectivity());
        assert!(timeout.is_timeout());

        let invalid = TransportError::invalid_request("empty URL");
        assert!(!invalid.is_connectivity());
        assert!(!invalid.is_timeout());
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::connection_failed("connection refused");
        assert!(err.to_string().contains("connection refused"));

        let err = TransportError::dns("api.example.com");
        assert!(err.to_string().contains("api.example.com"));
    }

    #[test]
    fn test_pipeline_error_fallback_failed() {
        let err = PipelineError::fallback_failed("template missing", "handled failure");
        assert!(err.is_fallback_failure());
        assert!(err.to_string().contains("template missing"));

        let err = PipelineError::invalid_config("failure_threshold must be at least 1");
        assert!(!err.is_fallback_failure());
    }
}
