//! Circuit breaker implementation.

use crate::circuit_breaker::config::CircuitBreakerConfig;
use crate::circuit_breaker::state::{BreakerMetrics, BreakerState, BreakerStatus};
use crate::core::outcome::{CallOutcome, FailureCause};

use std::fmt;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A circuit breaker guarding the call path.
///
/// The breaker watches consecutive handled failures and rejects calls
/// outright while the upstream looks broken, giving it room to recover.
///
/// # States
///
/// - **Closed**: Normal operation. Calls pass through, consecutive
///   handled failures are counted, a success resets the count.
/// - **Open**: The threshold was reached. Calls are rejected without
///   touching the transport until the break window elapses.
/// - **Half-Open**: The window elapsed. Exactly one probe call is
///   admitted; its outcome decides between Closed and a fresh Open.
///
/// The breaker never invokes anything itself. Callers ask for admission,
/// run the call, and resolve the returned permit with the classified
/// outcome. Unhandled errors resolve permits without moving the state
/// machine, and a permit dropped mid-flight releases its probe slot.
///
/// # Example
///
/// ```rust,ignore
/// use callguard::circuit_breaker::{Admission, CircuitBreaker, CircuitBreakerConfig};
///
/// let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
///
/// match breaker.admit() {
///     Admission::Admitted(permit) => {
///         let outcome = run_the_call().await;
///         permit.record(&outcome);
///     }
///     Admission::Rejected { retry_after } => {
///         // Substitute, queue, or surface the rejection.
///     }
/// }
/// ```
pub struct CircuitBreaker {
    /// Current state of the circuit.
    state: RwLock<BreakerState>,
    /// Configuration.
    config: CircuitBreakerConfig,
    /// Metrics.
    metrics: RwLock<BreakerMetrics>,
}

/// The breaker's decision for one call.
#[derive(Debug)]
pub enum Admission<'a> {
    /// The call may proceed; resolve the permit with its outcome.
    Admitted(CallPermit<'a>),

    /// The circuit is open; the call must not be attempted.
    Rejected {
        /// Remaining open window, if known.
        retry_after: Option<Duration>,
    },
}

impl Admission<'_> {
    /// Returns `true` if the call was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }

    /// Converts a rejection into its handled failure cause.
    pub fn rejection_cause(&self) -> Option<FailureCause> {
        match self {
            Self::Rejected { retry_after } => Some(FailureCause::CircuitOpen {
                retry_after: *retry_after,
            }),
            Self::Admitted(_) => None,
        }
    }
}

impl CircuitBreaker {
    /// Creates a new circuit breaker with the given configuration.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: RwLock::new(BreakerState::closed()),
            config,
            metrics: RwLock::new(BreakerMetrics::new()),
        }
    }

    /// Creates a new circuit breaker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }

    /// Returns a snapshot of the stored state.
    pub fn state(&self) -> BreakerState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the effective status right now.
    ///
    /// Read-only: repeated calls without intervening executions never
    /// mutate the breaker. An open circuit whose window has elapsed reads
    /// as half-open even though the stored transition happens on the next
    /// admission.
    pub fn current_state(&self) -> BreakerStatus {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .effective_status(Instant::now())
    }

    /// Returns a copy of the current metrics.
    pub fn metrics(&self) -> BreakerMetrics {
        self.metrics
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Asks the breaker whether a call may proceed.
    ///
    /// Open circuits whose window has elapsed transition to half-open
    /// here, firing the on-half-open hook before the probe permit is
    /// handed out. Rejections are counted in the metrics.
    pub fn admit(&self) -> Admission<'_> {
        enum Decision {
            Standard,
            Probe { entered_half_open: bool },
            Reject { retry_after: Option<Duration> },
        }

        let decision = {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let now = Instant::now();

            match &*state {
                BreakerState::Closed { .. } => Decision::Standard,

                BreakerState::Open { until, .. } => {
                    if now >= *until {
                        *state = BreakerState::HalfOpen {
                            probe_in_flight: true,
                        };
                        Decision::Probe {
                            entered_half_open: true,
                        }
                    } else {
                        Decision::Reject {
                            retry_after: Some(*until - now),
                        }
                    }
                }

                BreakerState::HalfOpen { probe_in_flight } => {
                    if *probe_in_flight {
                        // Another caller holds the probe slot.
                        Decision::Reject { retry_after: None }
                    } else {
                        *state = BreakerState::HalfOpen {
                            probe_in_flight: true,
                        };
                        Decision::Probe {
                            entered_half_open: false,
                        }
                    }
                }
            }
        };

        match decision {
            Decision::Standard => Admission::Admitted(CallPermit {
                breaker: self,
                probe: false,
                resolved: false,
            }),
            Decision::Probe { entered_half_open } => {
                self.metrics
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .record_probe();
                if entered_half_open {
                    tracing::info!("Circuit breaker half open");
                    self.config.hooks.fire_half_open();
                }
                Admission::Admitted(CallPermit {
                    breaker: self,
                    probe: true,
                    resolved: false,
                })
            }
            Decision::Reject { retry_after } => {
                self.metrics
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .record_rejected();
                tracing::debug!(retry_after = ?retry_after, "Circuit breaker rejected call");
                Admission::Rejected { retry_after }
            }
        }
    }

    /// Forces the circuit into the open state.
    ///
    /// Administrative override; lifecycle hooks are not fired.
    pub fn force_open(&self) {
        let now = Instant::now();
        *self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = BreakerState::Open {
            opened_at: now,
            until: now + self.config.break_duration,
        };
        self.metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_opened();
        tracing::info!("Circuit breaker forced open");
    }

    /// Forces the circuit into the closed state.
    ///
    /// Administrative override; lifecycle hooks are not fired.
    pub fn force_close(&self) {
        *self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = BreakerState::closed();
        tracing::info!("Circuit breaker forced closed");
    }

    /// Resets the circuit breaker state and metrics.
    pub fn reset(&self) {
        *self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = BreakerState::closed();
        *self
            .metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = BreakerMetrics::new();
    }

    /// Records a success for an admitted call.
    fn record_success(&self, probe: bool) {
        self.metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_success();

        let closed_from_half_open = {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match &*state {
                BreakerState::Closed { .. } => {
                    *state = BreakerState::closed();
                    false
                }
                BreakerState::HalfOpen { .. } if probe => {
                    *state = BreakerState::closed();
                    true
                }
                // A stale permit resolving after an administrative
                // override; leave the state alone.
                _ => false,
            }
        };

        if closed_from_half_open {
            self.metrics
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .record_closed();
            tracing::info!("Circuit breaker reset");
            self.config.hooks.fire_reset();
        }
    }

    /// Records a handled failure for an admitted call.
    fn record_failure(&self, probe: bool) {
        self.metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_failure();

        let opened = {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let now = Instant::now();

            match &*state {
                BreakerState::Closed {
                    consecutive_failures,
                } => {
                    let new_count = consecutive_failures + 1;
                    if new_count >= self.config.failure_threshold {
                        *state = BreakerState::Open {
                            opened_at: now,
                            until: now + self.config.break_duration,
                        };
                        Some(new_count)
                    } else {
                        *state = BreakerState::Closed {
                            consecutive_failures: new_count,
                        };
                        None
                    }
                }

                BreakerState::HalfOpen { .. } if probe => {
                    // A failed probe reopens the circuit with a fresh window.
                    *state = BreakerState::Open {
                        opened_at: now,
                        until: now + self.config.break_duration,
                    };
                    Some(self.config.failure_threshold)
                }

                _ => None,
            }
        };

        if let Some(consecutive_failures) = opened {
            self.metrics
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .record_opened();
            tracing::info!(
                consecutive_failures,
                window_ms = self.config.break_duration.as_millis() as u64,
                "Circuit breaker opened"
            );
            self.config.hooks.fire_open(self.config.break_duration);
        }
    }

    /// Releases a permit that resolved to neither success nor failure.
    fn release_unresolved(&self, probe: bool) {
        if !probe {
            return;
        }
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let BreakerState::HalfOpen {
            probe_in_flight: true,
        } = &*state
        {
            *state = BreakerState::HalfOpen {
                probe_in_flight: false,
            };
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field(
                "state",
                &*self
                    .state
                    .read()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            )
            .field("config", &self.config)
            .finish()
    }
}

/// Proof that the breaker admitted a call.
///
/// Resolve it with [`record`](CallPermit::record) once the call's
/// classified outcome is known. Dropping an unresolved permit releases a
/// claimed probe slot without recording anything, so an aborted call
/// counts as neither success nor failure.
#[must_use = "resolve the permit with record(), or the call will not count"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    resolved: bool,
}

impl CallPermit<'_> {
    /// Returns `true` if this permit is the half-open probe.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    /// Resolves the permit with the call's classified outcome.
    ///
    /// Successes and handled failures move the state machine; unhandled
    /// errors release the permit without a transition.
    pub fn record(mut self, outcome: &CallOutcome) {
        self.resolved = true;
        match outcome {
            CallOutcome::Success(_) => self.breaker.record_success(self.probe),
            CallOutcome::HandledFailure(_) => self.breaker.record_failure(self.probe),
            CallOutcome::UnhandledError(_) => self.breaker.release_unresolved(self.probe),
        }
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.breaker.release_unresolved(self.probe);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::config::BreakerHooks;
    use crate::core::types::CallResponse;
    use crate::core::TransportError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn success() -> CallOutcome {
        CallOutcome::Success(CallResponse::ok())
    }

    fn failure() -> CallOutcome {
        CallOutcome::HandledFailure(FailureCause::Response(CallResponse::not_found()))
    }

    fn unhandled() -> CallOutcome {
        CallOutcome::UnhandledError(TransportError::connection_failed("refused"))
    }

    fn admit_and_record(breaker: &CircuitBreaker, outcome: CallOutcome) -> bool {
        match breaker.admit() {
            Admission::Admitted(permit) => {
                permit.record(&outcome);
                true
            }
            Admission::Rejected { .. } => false,
        }
    }

    #[test]
    fn test_passes_through_when_closed() {
        let breaker = CircuitBreaker::with_defaults();

        assert!(admit_and_record(&breaker, success()));
        assert!(breaker.state().is_closed());
        assert_eq!(breaker.current_state(), BreakerStatus::Closed);
        assert_eq!(breaker.metrics().successful_calls, 1);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let config = CircuitBreakerConfig::new().with_failure_threshold(3);
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, failure());
        admit_and_record(&breaker, failure());
        assert_eq!(breaker.state().consecutive_failures(), Some(2));

        admit_and_record(&breaker, success());
        assert_eq!(breaker.state().consecutive_failures(), Some(0));
    }

    #[test]
    fn test_opens_after_threshold_and_rejects() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());

        // Default threshold is 2: opens on exactly the second failure.
        admit_and_record(&breaker, failure());
        assert!(breaker.state().is_closed());
        admit_and_record(&breaker, failure());
        assert!(breaker.state().is_open());
        assert_eq!(breaker.metrics().times_opened, 1);

        // Further calls are rejected without a permit.
        let admission = breaker.admit();
        assert!(!admission.is_admitted());
        let cause = admission.rejection_cause().unwrap();
        assert!(cause.is_circuit_open());
        assert_eq!(breaker.metrics().rejected_calls, 1);
    }

    #[test]
    fn test_rejection_reports_remaining_window() {
        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(1)
            .with_break_duration(Duration::from_secs(10));
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, failure());
        match breaker.admit() {
            Admission::Rejected { retry_after } => {
                let wait = retry_after.expect("open rejection knows its window");
                assert!(wait <= Duration::from_secs(10));
                assert!(wait > Duration::from_secs(8));
            }
            Admission::Admitted(_) => panic!("expected rejection"),
        };
    }

    #[tokio::test]
    async fn test_half_open_hook_fires_before_probe_outcome() {
        let half_open_count = Arc::new(AtomicU32::new(0));
        let half_open_clone = Arc::clone(&half_open_count);

        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(1)
            .with_break_duration(Duration::from_millis(20))
            .with_hooks(BreakerHooks::new().on_half_open(move || {
                half_open_clone.fetch_add(1, Ordering::SeqCst);
            }));
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, failure());
        assert!(breaker.state().is_open());

        tokio::time::sleep(Duration::from_millis(40)).await;

        // The stored state is still Open, but reads report the window over.
        assert!(breaker.state().is_open());
        assert_eq!(breaker.current_state(), BreakerStatus::HalfOpen);

        let admission = breaker.admit();
        // The hook fired during admission, before any outcome exists.
        assert_eq!(half_open_count.load(Ordering::SeqCst), 1);
        match admission {
            Admission::Admitted(permit) => {
                assert!(permit.is_probe());
                permit.record(&success());
            }
            Admission::Rejected { .. } => panic!("expected the probe to be admitted"),
        }
    }

    #[tokio::test]
    async fn test_probe_success_closes_circuit() {
        let reset_count = Arc::new(AtomicU32::new(0));
        let reset_clone = Arc::clone(&reset_count);

        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(1)
            .with_break_duration(Duration::from_millis(20))
            .with_hooks(BreakerHooks::new().on_reset(move || {
                reset_clone.fetch_add(1, Ordering::SeqCst);
            }));
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, failure());
        tokio::time::sleep(Duration::from_millis(40)).await;
        admit_and_record(&breaker, success());

        assert!(breaker.state().is_closed());
        assert_eq!(breaker.state().consecutive_failures(), Some(0));
        assert_eq!(breaker.metrics().times_closed, 1);
        assert_eq!(reset_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_failure_reopens_with_fresh_window() {
        let open_count = Arc::new(AtomicU32::new(0));
        let open_clone = Arc::clone(&open_count);

        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(1)
            .with_break_duration(Duration::from_millis(20))
            .with_hooks(BreakerHooks::new().on_open(move |_window| {
                open_clone.fetch_add(1, Ordering::SeqCst);
            }));
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, failure());
        let first_opened_at = match breaker.state() {
            BreakerState::Open { opened_at, .. } => opened_at,
            other => panic!("expected open, got {other:?}"),
        };

        tokio::time::sleep(Duration::from_millis(40)).await;
        admit_and_record(&breaker, failure());

        match breaker.state() {
            BreakerState::Open { opened_at, .. } => assert!(opened_at > first_opened_at),
            other => panic!("expected open, got {other:?}"),
        }
        assert_eq!(open_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_probe_slot() {
        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(1)
            .with_break_duration(Duration::from_millis(20));
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, failure());
        tokio::time::sleep(Duration::from_millis(40)).await;

        let probe = match breaker.admit() {
            Admission::Admitted(permit) => permit,
            Admission::Rejected { .. } => panic!("expected probe admission"),
        };
        assert!(probe.is_probe());

        // While the probe is in flight, everyone else observes Open.
        assert!(!breaker.admit().is_admitted());
        assert!(!breaker.admit().is_admitted());
        assert_eq!(breaker.metrics().rejected_calls, 2);

        probe.record(&success());
        assert!(breaker.state().is_closed());
    }

    #[tokio::test]
    async fn test_dropped_probe_releases_slot() {
        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(1)
            .with_break_duration(Duration::from_millis(20));
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, failure());
        tokio::time::sleep(Duration::from_millis(40)).await;

        match breaker.admit() {
            Admission::Admitted(permit) => drop(permit),
            Admission::Rejected { .. } => panic!("expected probe admission"),
        }

        // The aborted probe was not counted and the slot is free again.
        assert!(breaker.state().is_half_open());
        match breaker.admit() {
            Admission::Admitted(permit) => {
                assert!(permit.is_probe());
                permit.record(&success());
            }
            Admission::Rejected { .. } => panic!("slot should have been released"),
        }
        assert!(breaker.state().is_closed());
        assert_eq!(breaker.metrics().probe_calls, 2);
    }

    #[tokio::test]
    async fn test_unhandled_probe_outcome_releases_without_transition() {
        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(1)
            .with_break_duration(Duration::from_millis(20));
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, failure());
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(admit_and_record(&breaker, unhandled()));
        // Neither closed nor reopened; the slot is simply free again.
        assert!(breaker.state().is_half_open());
        assert_eq!(breaker.metrics().times_closed, 0);
        assert_eq!(breaker.metrics().times_opened, 1);
    }

    #[test]
    fn test_unhandled_errors_do_not_count_when_closed() {
        let config = CircuitBreakerConfig::new().with_failure_threshold(1);
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, unhandled());
        admit_and_record(&breaker, unhandled());

        assert!(breaker.state().is_closed());
        assert_eq!(breaker.state().consecutive_failures(), Some(0));
        assert_eq!(breaker.metrics().failed_calls, 0);
    }

    #[test]
    fn test_current_state_reads_are_idempotent() {
        let breaker = CircuitBreaker::with_defaults();

        assert_eq!(breaker.current_state(), BreakerStatus::Closed);
        assert_eq!(breaker.current_state(), BreakerStatus::Closed);
        assert!(breaker.state().is_closed());
    }

    #[tokio::test]
    async fn test_current_state_does_not_mutate_after_window() {
        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(1)
            .with_break_duration(Duration::from_millis(10));
        let breaker = CircuitBreaker::new(config);

        admit_and_record(&breaker, failure());
        tokio::time::sleep(Duration::from_millis(25)).await;

        // Reads report half-open without performing the transition.
        assert_eq!(breaker.current_state(), BreakerStatus::HalfOpen);
        assert_eq!(breaker.current_state(), BreakerStatus::HalfOpen);
        assert!(breaker.state().is_open());
    }

    #[test]
    fn test_force_open_close() {
        let breaker = CircuitBreaker::with_defaults();

        assert!(breaker.state().is_closed());

        breaker.force_open();
        assert!(breaker.state().is_open());
        assert!(!breaker.admit().is_admitted());

        breaker.force_close();
        assert!(breaker.state().is_closed());
    }
}
