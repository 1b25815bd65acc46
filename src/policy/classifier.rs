//! Outcome classification.
//!
//! The classifier is the single place where "handled failure" is decided.
//! It converts each raw transport result into a [`CallOutcome`] using two
//! declarative matchers: one over well-formed responses, one over
//! transport errors. Classification is pure; it never performs I/O and
//! never mutates anything.

use crate::core::outcome::{CallOutcome, FailureCause};
use crate::core::types::CallResponse;
use crate::core::TransportError;

use serde::{Deserialize, Serialize};

/// A condition evaluated against a well-formed response.
///
/// A matched response becomes a handled failure; an unmatched one is a
/// success, no matter how unhealthy its status looks. Matchers compose
/// with `And`/`Or`/`Not`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseMatcher {
    /// Matches an exact status code.
    StatusIs {
        /// The status code to match.
        status: u16,
    },

    /// Matches any status code in the list.
    StatusIn {
        /// Status codes to match.
        statuses: Vec<u16>,
    },

    /// Matches any status code in the inclusive range.
    StatusBetween {
        /// Lowest matching status code.
        min: u16,
        /// Highest matching status code.
        max: u16,
    },

    /// Matches any 4xx status.
    ClientError,

    /// Matches any 5xx status.
    ServerError,

    /// Matches if the named header equals the value (header names are
    /// compared case-insensitively).
    HeaderEquals {
        /// Header name.
        name: String,
        /// Expected header value.
        value: String,
    },

    /// Always matches.
    Always,

    /// Never matches.
    Never,

    /// Logical AND of multiple matchers.
    And {
        /// Matchers that must all match.
        matchers: Vec<ResponseMatcher>,
    },

    /// Logical OR of multiple matchers.
    Or {
        /// Matchers where at least one must match.
        matchers: Vec<ResponseMatcher>,
    },

    /// Logical NOT of a matcher.
    Not {
        /// Matcher to negate.
        matcher: Box<ResponseMatcher>,
    },
}

impl ResponseMatcher {
    /// Creates a matcher for an exact status code.
    pub fn status(status: u16) -> Self {
        Self::StatusIs { status }
    }

    /// Creates a matcher for any of the given status codes.
    pub fn status_in(statuses: impl Into<Vec<u16>>) -> Self {
        Self::StatusIn {
            statuses: statuses.into(),
        }
    }

    /// Combines this matcher with another using OR.
    pub fn or(self, other: ResponseMatcher) -> Self {
        match self {
            Self::Or { mut matchers } => {
                matchers.push(other);
                Self::Or { matchers }
            }
            first => Self::Or {
                matchers: vec![first, other],
            },
        }
    }

    /// Negates this matcher.
    pub fn negate(self) -> Self {
        Self::Not {
            matcher: Box::new(self),
        }
    }

    /// Evaluates this matcher against a response.
    pub fn matches(&self, response: &CallResponse) -> bool {
        match self {
            Self::StatusIs { status } => response.status == *status,
            Self::StatusIn { statuses } => statuses.contains(&response.status),
            Self::StatusBetween { min, max } => (*min..=*max).contains(&response.status),
            Self::ClientError => response.is_client_error(),
            Self::ServerError => response.is_server_error(),
            Self::HeaderEquals { name, value } => response
                .headers
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case(name) && v == value),
            Self::Always => true,
            Self::Never => false,
            Self::And { matchers } => matchers.iter().all(|m| m.matches(response)),
            Self::Or { matchers } => matchers.iter().any(|m| m.matches(response)),
            Self::Not { matcher } => !matcher.matches(response),
        }
    }
}

/// A condition evaluated against a transport error.
///
/// A matched error becomes a handled failure (retried, breaker-counted);
/// an unmatched one stays an unhandled error that bypasses both policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportMatcher {
    /// Matches timeouts.
    Timeout,

    /// Matches failed connections.
    ConnectionFailed,

    /// Matches DNS resolution failures.
    Dns,

    /// Matches TLS negotiation failures.
    Tls,

    /// Matches any connectivity-class error (timeout, connection, DNS,
    /// TLS, I/O).
    Connectivity,

    /// Always matches.
    Always,

    /// Never matches.
    Never,

    /// Logical AND of multiple matchers.
    And {
        /// Matchers that must all match.
        matchers: Vec<TransportMatcher>,
    },

    /// Logical OR of multiple matchers.
    Or {
        /// Matchers where at least one must match.
        matchers: Vec<TransportMatcher>,
    },

    /// Logical NOT of a matcher.
    Not {
        /// Matcher to negate.
        matcher: Box<TransportMatcher>,
    },
}

impl TransportMatcher {
    /// Evaluates this matcher against a transport error.
    pub fn matches(&self, error: &TransportError) -> bool {
        match self {
            Self::Timeout => error.is_timeout(),
            Self::ConnectionFailed => matches!(error, TransportError::ConnectionFailed { .. }),
            Self::Dns => matches!(error, TransportError::Dns { .. }),
            Self::Tls => matches!(error, TransportError::Tls { .. }),
            Self::Connectivity => error.is_connectivity(),
            Self::Always => true,
            Self::Never => false,
            Self::And { matchers } => matchers.iter().all(|m| m.matches(error)),
            Self::Or { matchers } => matchers.iter().any(|m| m.matches(error)),
            Self::Not { matcher } => !matcher.matches(error),
        }
    }
}

/// Classifies raw transport results into [`CallOutcome`] values.
///
/// The default configuration mirrors a service that only treats "not
/// found" as a handled failure: responses with status 404 are flagged,
/// everything else passes through as success, and transport errors stay
/// unhandled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeClassifier {
    /// Responses matching this become handled failures.
    pub failure_when: ResponseMatcher,

    /// Transport errors matching this become handled failures; the rest
    /// stay unhandled.
    pub transport_failure_when: TransportMatcher,
}

impl Default for OutcomeClassifier {
    fn default() -> Self {
        Self {
            failure_when: ResponseMatcher::StatusIs { status: 404 },
            transport_failure_when: TransportMatcher::Never,
        }
    }
}

impl OutcomeClassifier {
    /// Creates a classifier flagging responses matched by `failure_when`.
    pub fn new(failure_when: ResponseMatcher) -> Self {
        Self {
            failure_when,
            transport_failure_when: TransportMatcher::Never,
        }
    }

    /// Sets the transport error matcher.
    pub fn with_transport_failures(mut self, matcher: TransportMatcher) -> Self {
        self.transport_failure_when = matcher;
        self
    }

    /// A classifier tuned for typical transient upstream faults: 5xx and
    /// 429 responses plus connectivity-class transport errors.
    pub fn transient_faults() -> Self {
        Self {
            failure_when: ResponseMatcher::ServerError.or(ResponseMatcher::status(429)),
            transport_failure_when: TransportMatcher::Connectivity,
        }
    }

    /// Classifies one raw transport result.
    pub fn classify(&self, result: Result<CallResponse, TransportError>) -> CallOutcome {
        match result {
            Ok(response) => {
                if self.failure_when.matches(&response) {
                    CallOutcome::HandledFailure(FailureCause::Response(response))
                } else {
                    CallOutcome::Success(response)
                }
            }
            Err(error) => {
                if self.transport_failure_when.matches(&error) {
                    CallOutcome::HandledFailure(FailureCause::Transport(error))
                } else {
                    CallOutcome::UnhandledError(error)
                }
            }
        }
    }
}
