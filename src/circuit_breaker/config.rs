//! Circuit breaker configuration.

use crate::core::PipelineError;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type OpenHook = Arc<dyn Fn(Duration) + Send + Sync>;
type TransitionHook = Arc<dyn Fn() + Send + Sync>;

/// Configuration for a circuit breaker.
///
/// The breaker opens after `failure_threshold` consecutive handled
/// failures and stays open for `break_duration`, after which a single
/// probe call decides whether to close again.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive handled failures before opening the circuit.
    pub failure_threshold: u32,

    /// How long the circuit stays open before allowing a probe.
    pub break_duration: Duration,

    /// Lifecycle hooks fired on state transitions.
    pub hooks: BreakerHooks,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            break_duration: Duration::from_secs(10),
            hooks: BreakerHooks::default(),
        }
    }
}

impl CircuitBreakerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failure threshold.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the break duration.
    pub fn with_break_duration(mut self, duration: Duration) -> Self {
        self.break_duration = duration;
        self
    }

    /// Sets the lifecycle hooks.
    pub fn with_hooks(mut self, hooks: BreakerHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Creates a configuration that trips eagerly.
    ///
    /// This configuration:
    /// - Opens on the first handled failure
    /// - Keeps the circuit open longer (60 seconds)
    pub fn strict() -> Self {
        Self {
            failure_threshold: 1,
            break_duration: Duration::from_secs(60),
            hooks: BreakerHooks::default(),
        }
    }

    /// Creates a configuration optimized for high availability.
    ///
    /// This configuration:
    /// - Tolerates more consecutive failures (5)
    /// - Keeps the circuit open for a shorter time (5 seconds)
    pub fn high_availability() -> Self {
        Self {
            failure_threshold: 5,
            break_duration: Duration::from_secs(5),
            hooks: BreakerHooks::default(),
        }
    }

    /// Checks the configuration for values that cannot work.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.failure_threshold == 0 {
            return Err(PipelineError::invalid_config(
                "failure_threshold must be at least 1",
            ));
        }
        if self.break_duration.is_zero() {
            return Err(PipelineError::invalid_config(
                "break_duration must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Optional callbacks fired on breaker state transitions.
///
/// Hooks are synchronous, side-effect-only, and invoked outside the
/// state lock; nothing they do can feed back into transition decisions.
/// The on-half-open hook fires when the probe is admitted, before its
/// outcome is known.
#[derive(Clone, Default)]
pub struct BreakerHooks {
    on_open: Option<OpenHook>,
    on_reset: Option<TransitionHook>,
    on_half_open: Option<TransitionHook>,
}

impl fmt::Debug for BreakerHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerHooks")
            .field("on_open", &self.on_open.is_some())
            .field("on_reset", &self.on_reset.is_some())
            .field("on_half_open", &self.on_half_open.is_some())
            .finish()
    }
}

impl BreakerHooks {
    /// Creates an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook fired when the circuit opens. Receives the open
    /// window duration.
    pub fn on_open<F>(mut self, hook: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.on_open = Some(Arc::new(hook));
        self
    }

    /// Sets the hook fired when a probe closes the circuit.
    pub fn on_reset<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_reset = Some(Arc::new(hook));
        self
    }

    /// Sets the hook fired when the circuit transitions to half-open.
    pub fn on_half_open<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_half_open = Some(Arc::new(hook));
        self
    }

    pub(crate) fn fire_open(&self, window: Duration) {
        if let Some(hook) = &self.on_open {
            hook(window);
        }
    }

    pub(crate) fn fire_reset(&self) {
        if let Some(hook) = &self.on_reset {
            hook();
        }
    }

    pub(crate) fn fire_half_open(&self) {
        if let Some(hook) = &self.on_half_open {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 2);
        assert_eq!(config.break_duration, Duration::from_secs(10));
    }

    #[test]
    fn test_config_builder() {
        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(10)
            .with_break_duration(Duration::from_secs(60));

        assert_eq!(config.failure_threshold, 10);
        assert_eq!(config.break_duration, Duration::from_secs(60));
    }

    #[test]
    fn test_presets() {
        assert_eq!(CircuitBreakerConfig::strict().failure_threshold, 1);
        assert_eq!(
            CircuitBreakerConfig::high_availability().break_duration,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_validate() {
        assert!(CircuitBreakerConfig::default().validate().is_ok());
        assert!(CircuitBreakerConfig::new()
            .with_failure_threshold(0)
            .validate()
            .is_err());
        assert!(CircuitBreakerConfig::new()
            .with_break_duration(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_hooks_fire() {
        let opened = Arc::new(AtomicU32::new(0));
        let opened_clone = Arc::clone(&opened);

        let hooks = BreakerHooks::new()
            .on_open(move |_window| {
                opened_clone.fetch_add(1, Ordering::SeqCst);
            })
            .on_reset(|| {})
            .on_half_open(|| {});

        hooks.fire_open(Duration::from_secs(10));
        hooks.fire_open(Duration::from_secs(10));
        hooks.fire_reset();
        hooks.fire_half_open();

        assert_eq!(opened.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_hooks_are_noops() {
        let hooks = BreakerHooks::new();
        hooks.fire_open(Duration::from_secs(1));
        hooks.fire_reset();
        hooks.fire_half_open();
    }
}
