//! Call resolution structures.
//!
//! This module defines `CallResolution`, the record handed back for every
//! pipeline execution, including where the response came from and how the
//! circuit looked once the call settled.

use crate::circuit_breaker::BreakerStatus;
use crate::core::types::{CallContext, CallResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a delivered response came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The primary call produced the response.
    Primary,

    /// The fallback provider substituted the response.
    Fallback {
        /// What pushed the pipeline into the fallback.
        trigger: String,
    },
}

impl ResolutionSource {
    /// Returns `true` if the primary call produced the response.
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary)
    }

    /// Returns `true` if the fallback produced the response.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Returns the fallback trigger description, if any.
    pub fn trigger(&self) -> Option<&str> {
        match self {
            Self::Fallback { trigger } => Some(trigger),
            Self::Primary => None,
        }
    }
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback { trigger } => write!(f, "fallback ({trigger})"),
        }
    }
}

/// The complete record of one pipeline execution.
///
/// Every execution that does not end in a [`PipelineError`] produces one
/// of these. The response is always present; `source` says whether the
/// upstream or the fallback supplied it.
///
/// [`PipelineError`]: crate::core::PipelineError
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResolution {
    /// Unique identifier for this execution.
    pub id: String,

    /// The response delivered to the caller.
    pub response: CallResponse,

    /// Where the response came from.
    pub source: ResolutionSource,

    /// How many transport attempts were made. Zero when the circuit
    /// rejected the call before it reached the transport.
    pub attempts: u32,

    /// Effective circuit state once the call settled.
    pub breaker_status: BreakerStatus,

    /// When the execution started.
    pub started_at: DateTime<Utc>,

    /// When the execution settled.
    pub resolved_at: DateTime<Utc>,

    /// How long the execution took, including retry waits.
    #[serde(with = "duration_serde")]
    pub duration: Duration,

    /// The context the call was executed under.
    pub context: CallContext,
}

impl CallResolution {
    /// Creates a new `CallResolution` settling now.
    pub fn new(
        response: CallResponse,
        source: ResolutionSource,
        attempts: u32,
        breaker_status: BreakerStatus,
        started_at: DateTime<Utc>,
        duration: Duration,
        context: CallContext,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            response,
            source,
            attempts,
            breaker_status,
            started_at,
            resolved_at: Utc::now(),
            duration,
            context,
        }
    }

    /// Returns `true` if the primary call produced the response.
    pub fn is_primary(&self) -> bool {
        self.source.is_primary()
    }

    /// Returns `true` if the fallback produced the response.
    pub fn is_fallback(&self) -> bool {
        self.source.is_fallback()
    }

    /// Returns the delivered status code.
    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// One-line summary for logs and CLIs.
    pub fn summary(&self) -> String {
        format!(
            "{} {} via {} after {} attempt{}",
            self.response.status,
            self.response.status_label(),
            self.source,
            self.attempts,
            if self.attempts == 1 { "" } else { "s" }
        )
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(source: ResolutionSource, attempts: u32) -> CallResolution {
        CallResolution::new(
            CallResponse::ok(),
            source,
            attempts,
            BreakerStatus::Closed,
            Utc::now(),
            Duration::from_millis(42),
            CallContext::new(),
        )
    }

    #[test]
    fn test_primary_resolution() {
        let res = resolution(ResolutionSource::Primary, 1);

        assert!(res.is_primary());
        assert!(!res.is_fallback());
        assert_eq!(res.status(), 200);
        assert_eq!(res.summary(), "200 OK via primary after 1 attempt");
    }

    #[test]
    fn test_fallback_resolution() {
        let res = resolution(
            ResolutionSource::Fallback {
                trigger: "flagged response 404 Not Found".to_string(),
            },
            3,
        );

        assert!(res.is_fallback());
        assert_eq!(res.source.trigger(), Some("flagged response 404 Not Found"));
        assert!(res.summary().contains("after 3 attempts"));
    }

    #[test]
    fn test_serializes_duration_as_millis() {
        let res = resolution(ResolutionSource::Primary, 1);

        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["duration"], 42);
        assert_eq!(json["source"]["type"], "primary");
        assert_eq!(json["breaker_status"], "closed");
    }

    #[test]
    fn test_resolution_round_trips() {
        let res = resolution(
            ResolutionSource::Fallback {
                trigger: "circuit open".to_string(),
            },
            0,
        );

        let json = serde_json::to_string(&res).unwrap();
        let back: CallResolution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, res.id);
        assert_eq!(back.source, res.source);
        assert_eq!(back.duration, res.duration);
    }
}
