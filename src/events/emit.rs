//! Event types and emission functions.

use crate::core::{CallContext, CallRequest};
use crate::pipeline::CallResolution;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base trait for pipeline events.
pub trait PipelineEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Event record for a resolved call.
///
/// The same fields are written to the `callguard::events` tracing target;
/// this struct exists for subscribers that ship events onward as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResolvedEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Unique execution ID.
    pub call_id: String,

    /// Correlation ID, if the caller supplied one.
    pub correlation_id: Option<String>,

    /// Identifier of the calling component, if supplied.
    pub caller: Option<String>,

    /// Delivered status code.
    pub status: u16,

    /// Where the response came from.
    pub source: String,

    /// Transport attempts made.
    pub attempts: u32,

    /// Effective circuit state when the call settled.
    pub breaker_status: String,

    /// Execution duration in milliseconds.
    pub duration_ms: u64,
}

impl From<&CallResolution> for CallResolvedEvent {
    fn from(resolution: &CallResolution) -> Self {
        Self {
            timestamp: resolution.resolved_at,
            call_id: resolution.id.clone(),
            correlation_id: resolution.context.correlation_id.clone(),
            caller: resolution.context.caller.clone(),
            status: resolution.response.status,
            source: resolution.source.to_string(),
            attempts: resolution.attempts,
            breaker_status: resolution.breaker_status.to_string(),
            duration_ms: resolution.duration.as_millis() as u64,
        }
    }
}

impl PipelineEvent for CallResolvedEvent {
    fn event_type(&self) -> &'static str {
        "call_resolved"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an event for a call entering the pipeline.
pub fn emit_call_started(request: &CallRequest, context: &CallContext) {
    tracing::info!(
        target: "callguard::events",
        event_type = "call_started",
        method = %request.method,
        url = %request.url,
        correlation_id = ?context.correlation_id,
        caller = ?context.caller,
        source = ?context.source,
        "Call started"
    );
}

/// Emits an event for a resolved call.
pub fn emit_call_resolved(resolution: &CallResolution) {
    tracing::info!(
        target: "callguard::events",
        event_type = "call_resolved",
        call_id = %resolution.id,
        correlation_id = ?resolution.context.correlation_id,
        caller = ?resolution.context.caller,
        status = resolution.response.status,
        status_label = %resolution.response.status_label(),
        source = %resolution.source,
        attempts = resolution.attempts,
        breaker_status = %resolution.breaker_status,
        duration_ms = resolution.duration.as_millis() as u64,
        "Call resolved"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::BreakerStatus;
    use crate::core::CallResponse;
    use crate::pipeline::ResolutionSource;
    use std::time::Duration;

    #[test]
    fn test_event_from_resolution() {
        let resolution = CallResolution::new(
            CallResponse::ok(),
            ResolutionSource::Fallback {
                trigger: "circuit open".to_string(),
            },
            0,
            BreakerStatus::Open,
            Utc::now(),
            Duration::from_millis(7),
            CallContext::new().with_caller("orders-service"),
        );

        let event = CallResolvedEvent::from(&resolution);
        assert_eq!(event.event_type(), "call_resolved");
        assert_eq!(event.call_id, resolution.id);
        assert_eq!(event.caller.as_deref(), Some("orders-service"));
        assert_eq!(event.status, 200);
        assert_eq!(event.source, "fallback (circuit open)");
        assert_eq!(event.breaker_status, "open");
        assert_eq!(event.duration_ms, 7);
    }
}
