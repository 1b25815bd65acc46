//! Circuit breaker state machine types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// A point-in-time view of the breaker, without internal bookkeeping.
///
/// This is what read-only inspection returns. It reflects the effective
/// state: an `Open` breaker whose window has elapsed reads as `HalfOpen`
/// even though the stored transition only happens on the call path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerStatus {
    /// Calls pass through normally.
    Closed,
    /// Calls are rejected without reaching the transport.
    Open,
    /// A single probe call is allowed through.
    HalfOpen,
}

impl BreakerStatus {
    /// Returns the name of the status.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The stored state of a circuit breaker.
#[derive(Debug, Clone)]
pub enum BreakerState {
    /// Circuit is closed; calls pass through normally.
    Closed {
        /// Number of consecutive handled failures.
        consecutive_failures: u32,
    },

    /// Circuit is open; calls are rejected.
    Open {
        /// When the circuit was opened.
        opened_at: Instant,
        /// When the open window elapses.
        until: Instant,
    },

    /// Circuit is half-open; one probe call decides what happens next.
    HalfOpen {
        /// Whether the probe slot is currently claimed.
        probe_in_flight: bool,
    },
}

impl BreakerState {
    /// Creates a new closed state.
    pub fn closed() -> Self {
        Self::Closed {
            consecutive_failures: 0,
        }
    }

    /// Returns `true` if the circuit is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// Returns `true` if the circuit is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Returns `true` if the circuit is half-open.
    pub fn is_half_open(&self) -> bool {
        matches!(self, Self::HalfOpen { .. })
    }

    /// Returns the consecutive failure count if closed.
    pub fn consecutive_failures(&self) -> Option<u32> {
        match self {
            Self::Closed {
                consecutive_failures,
            } => Some(*consecutive_failures),
            _ => None,
        }
    }

    /// Returns the stored status, ignoring window expiry.
    pub fn status(&self) -> BreakerStatus {
        match self {
            Self::Closed { .. } => BreakerStatus::Closed,
            Self::Open { .. } => BreakerStatus::Open,
            Self::HalfOpen { .. } => BreakerStatus::HalfOpen,
        }
    }

    /// Returns the effective status at `now`.
    ///
    /// An open circuit whose window has elapsed is reported half-open
    /// without being mutated; the stored transition happens on the next
    /// admission attempt.
    pub fn effective_status(&self, now: Instant) -> BreakerStatus {
        match self {
            Self::Open { until, .. } if now >= *until => BreakerStatus::HalfOpen,
            other => other.status(),
        }
    }

    /// Returns the name of the stored state.
    pub fn name(&self) -> &'static str {
        self.status().name()
    }
}

impl Default for BreakerState {
    fn default() -> Self {
        Self::closed()
    }
}

/// Metrics about circuit breaker behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakerMetrics {
    /// Total number of calls seen by the breaker.
    pub total_calls: u64,
    /// Number of calls that resolved successfully.
    pub successful_calls: u64,
    /// Number of calls that resolved as handled failures.
    pub failed_calls: u64,
    /// Number of calls rejected due to an open circuit.
    pub rejected_calls: u64,
    /// Number of half-open probe calls admitted.
    pub probe_calls: u64,
    /// Number of times the circuit has opened.
    pub times_opened: u64,
    /// Number of times the circuit has closed from half-open.
    pub times_closed: u64,
}

impl BreakerMetrics {
    /// Creates new empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful call.
    pub fn record_success(&mut self) {
        self.total_calls += 1;
        self.successful_calls += 1;
    }

    /// Records a handled failure.
    pub fn record_failure(&mut self) {
        self.total_calls += 1;
        self.failed_calls += 1;
    }

    /// Records a rejected call.
    pub fn record_rejected(&mut self) {
        self.total_calls += 1;
        self.rejected_calls += 1;
    }

    /// Records an admitted probe call.
    pub fn record_probe(&mut self) {
        self.probe_calls += 1;
    }

    /// Records that the circuit opened.
    pub fn record_opened(&mut self) {
        self.times_opened += 1;
    }

    /// Records that the circuit closed.
    pub fn record_closed(&mut self) {
        self.times_closed += 1;
    }

    /// Returns the success rate (0.0 to 1.0).
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 1.0;
        }
        self.successful_calls as f64 / self.total_calls as f64
    }

    /// Returns the failure rate (0.0 to 1.0).
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.failed_calls as f64 / self.total_calls as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_breaker_state_default() {
        let state = BreakerState::default();
        assert!(state.is_closed());
        assert_eq!(state.consecutive_failures(), Some(0));
        assert_eq!(state.status(), BreakerStatus::Closed);
    }

    #[test]
    fn test_breaker_state_names() {
        assert_eq!(BreakerState::closed().name(), "closed");
        assert_eq!(
            BreakerState::Open {
                opened_at: Instant::now(),
                until: Instant::now(),
            }
            .name(),
            "open"
        );
        assert_eq!(
            BreakerState::HalfOpen {
                probe_in_flight: false,
            }
            .name(),
            "half_open"
        );
        assert_eq!(BreakerStatus::HalfOpen.to_string(), "half_open");
    }

    #[test]
    fn test_effective_status_reports_elapsed_window() {
        let opened_at = Instant::now();
        let until = opened_at + Duration::from_millis(10);
        let state = BreakerState::Open { opened_at, until };

        assert_eq!(state.effective_status(opened_at), BreakerStatus::Open);
        assert_eq!(state.effective_status(until), BreakerStatus::HalfOpen);
        // The stored state itself is untouched by the read.
        assert!(state.is_open());
    }

    #[test]
    fn test_metrics() {
        let mut metrics = BreakerMetrics::new();
        assert_eq!(metrics.success_rate(), 1.0);
        assert_eq!(metrics.failure_rate(), 0.0);

        metrics.record_success();
        metrics.record_success();
        metrics.record_failure();
        metrics.record_rejected();

        assert_eq!(metrics.total_calls, 4);
        assert_eq!(metrics.successful_calls, 2);
        assert_eq!(metrics.failed_calls, 1);
        assert_eq!(metrics.rejected_calls, 1);
        assert_eq!(metrics.success_rate(), 0.5);
    }
}
