//! Classified call outcomes.
//!
//! Every transport attempt resolves to a [`CallOutcome`], the currency the
//! resilience policies trade in. The retry loop and the circuit breaker
//! make their decisions from outcomes alone; neither ever inspects a raw
//! response or error directly.

use crate::core::error::TransportError;
use crate::core::types::CallResponse;
use std::fmt;
use std::time::Duration;

/// The classified result of one pass through the inner pipeline.
///
/// The three variants drive the policies differently:
/// - `Success` ends retrying and counts as a breaker success.
/// - `HandledFailure` is retried while budget remains and counts as a
///   breaker failure.
/// - `UnhandledError` short-circuits retrying and is invisible to the
///   breaker; only the fallback still substitutes for it.
#[derive(Debug)]
pub enum CallOutcome {
    /// A well-formed response the classifier did not flag.
    Success(CallResponse),

    /// A failure the pipeline is configured to handle.
    HandledFailure(FailureCause),

    /// A transport error the classifier was not configured to handle.
    UnhandledError(TransportError),
}

impl CallOutcome {
    /// Returns `true` for a successful outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns `true` for a handled failure.
    pub fn is_handled_failure(&self) -> bool {
        matches!(self, Self::HandledFailure(_))
    }

    /// Returns `true` for an unhandled transport error.
    pub fn is_unhandled_error(&self) -> bool {
        matches!(self, Self::UnhandledError(_))
    }

    /// Returns the response if this outcome carries one.
    ///
    /// Both successes and handled response failures carry the upstream
    /// response; transport errors and breaker rejections do not.
    pub fn response(&self) -> Option<&CallResponse> {
        match self {
            Self::Success(response) => Some(response),
            Self::HandledFailure(FailureCause::Response(response)) => Some(response),
            _ => None,
        }
    }

    /// Returns a short description suitable for log fields.
    pub fn describe(&self) -> String {
        match self {
            Self::Success(response) => format!("success: {response}"),
            Self::HandledFailure(cause) => format!("handled failure: {cause}"),
            Self::UnhandledError(error) => format!("unhandled error: {error}"),
        }
    }
}

/// Why a call counted as a handled failure.
#[derive(Debug)]
pub enum FailureCause {
    /// The upstream answered, and the classifier flagged the response.
    Response(CallResponse),

    /// A transport error the classifier is configured to handle.
    Transport(TransportError),

    /// The circuit breaker rejected the call without attempting it.
    CircuitOpen {
        /// Remaining open window, if the breaker knows it.
        retry_after: Option<Duration>,
    },
}

impl FailureCause {
    /// Returns `true` if this failure is a breaker rejection.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// Returns the flagged response's status code, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(response) => Some(response.status),
            _ => None,
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(response) => write!(f, "flagged response {response}"),
            Self::Transport(error) => write!(f, "transport error: {error}"),
            Self::CircuitOpen { retry_after } => match retry_after {
                Some(wait) => write!(f, "circuit open (retry after {wait:?})"),
                None => write!(f, "circuit open"),
            },
        }
    }
}
