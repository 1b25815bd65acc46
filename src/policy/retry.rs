//! Retry configuration and logic.

use crate::core::outcome::CallOutcome;
use crate::core::types::CallResponse;
use crate::core::TransportError;
use crate::policy::classifier::OutcomeClassifier;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the retry stage.
///
/// `max_retries` counts re-invocations after the initial attempt, so the
/// transport is invoked at most `max_retries + 1` times and `max_retries
/// == 0` means exactly one attempt. The default waits double per retry:
/// 2s before the first retry, 4s before the second.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Maximum delay between retries.
    pub max_delay: Duration,

    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,

    /// Whether to add jitter to delays.
    pub jitter: bool,

    /// Custom delay function, overriding the exponential formula.
    custom_backoff: Option<Arc<dyn Fn(u32) -> Duration + Send + Sync>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: false,
            custom_backoff: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter", &self.jitter)
            .field("custom_backoff", &self.custom_backoff.is_some())
            .finish()
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables retries: the transport is invoked exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Sets the maximum number of retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Overrides delay computation with a custom function from retry
    /// number (1-based) to delay.
    pub fn with_backoff_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        self.custom_backoff = Some(Arc::new(f));
        self
    }

    /// Calculates the delay before a given retry (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        if let Some(backoff) = &self.custom_backoff {
            return backoff(attempt);
        }

        let base_delay = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32 - 1);

        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.jitter {
            // Simple deterministic jitter based on attempt number
            let jitter_factor = 0.5 + (attempt as f64 * 0.618033988749895) % 0.5;
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }

    /// Returns whether another retry fits in the budget.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_retries
    }

    /// Runs the retry loop around repeated transport attempts.
    ///
    /// Each attempt's raw result is classified; successes and unhandled
    /// errors return immediately, handled failures are retried with
    /// backoff until the budget runs out, and the last failure is
    /// returned when it does. Waits suspend the task, never the thread.
    pub async fn run<F, Fut>(
        &self,
        classifier: &OutcomeClassifier,
        mut attempt: F,
    ) -> RetryOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<CallResponse, TransportError>>,
    {
        let mut attempts_made = 0u32;
        loop {
            let outcome = classifier.classify(attempt().await);
            match outcome {
                CallOutcome::Success(_) | CallOutcome::UnhandledError(_) => {
                    return RetryOutcome {
                        outcome,
                        attempts: attempts_made + 1,
                    };
                }
                CallOutcome::HandledFailure(cause) => {
                    if !self.should_retry(attempts_made) {
                        return RetryOutcome {
                            outcome: CallOutcome::HandledFailure(cause),
                            attempts: attempts_made + 1,
                        };
                    }
                    attempts_made += 1;
                    let delay = self.delay_for_attempt(attempts_made);
                    tracing::debug!(
                        retry = attempts_made,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        cause = %cause,
                        "Retrying call"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

/// Result of one pass through the retry stage.
#[derive(Debug)]
pub struct RetryOutcome {
    /// The final classified outcome.
    pub outcome: CallOutcome,

    /// How many transport attempts were made.
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.initial_delay, Duration::from_secs(2));
        assert!(!policy.jitter);
    }

    #[test]
    fn test_no_retry() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_retries, 0);
        assert!(!policy.should_retry(0));
    }

    #[test]
    fn test_delay_doubles_per_retry() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_capped() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_backoff_multiplier(10.0);

        // 1 * 10 = 10, but capped at 5
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(5));
    }

    #[test]
    fn test_custom_backoff_fn() {
        let policy = RetryPolicy::new().with_backoff_fn(|retry| Duration::from_millis(retry as u64 * 7));

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(7));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(21));
    }

    #[tokio::test]
    async fn test_run_returns_success_immediately() {
        let policy = RetryPolicy::new();
        let classifier = OutcomeClassifier::default();
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let run = policy
            .run(&classifier, move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TransportError>(CallResponse::ok())
            })
            .await;

        assert!(run.outcome.is_success());
        assert_eq!(run.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_exhausts_budget_on_handled_failures() {
        let policy = RetryPolicy::new()
            .with_max_retries(2)
            .with_initial_delay(Duration::from_millis(5));
        let classifier = OutcomeClassifier::default();
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let run = policy
            .run(&classifier, move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TransportError>(CallResponse::not_found())
            })
            .await;

        assert!(run.outcome.is_handled_failure());
        assert_eq!(run.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_zero_retries_means_one_attempt() {
        let policy = RetryPolicy::no_retry();
        let classifier = OutcomeClassifier::default();
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let run = policy
            .run(&classifier, move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TransportError>(CallResponse::not_found())
            })
            .await;

        assert!(run.outcome.is_handled_failure());
        assert_eq!(run.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_succeeds_after_retries() {
        let policy = RetryPolicy::new()
            .with_max_retries(2)
            .with_initial_delay(Duration::from_millis(5));
        let classifier = OutcomeClassifier::default();
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let run = policy
            .run(&classifier, move || async move {
                let n = calls_ref.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Ok::<_, TransportError>(CallResponse::not_found())
                } else {
                    Ok(CallResponse::ok())
                }
            })
            .await;

        assert!(run.outcome.is_success());
        assert_eq!(run.attempts, 3);
    }

    #[tokio::test]
    async fn test_run_unhandled_error_short_circuits() {
        let policy = RetryPolicy::new().with_initial_delay(Duration::from_millis(5));
        let classifier = OutcomeClassifier::default();
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let run = policy
            .run(&classifier, move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Err::<CallResponse, _>(TransportError::connection_failed("refused"))
            })
            .await;

        assert!(run.outcome.is_unhandled_error());
        assert_eq!(run.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
