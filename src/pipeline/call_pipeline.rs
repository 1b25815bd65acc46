//! The main call pipeline implementation.

use crate::circuit_breaker::{Admission, BreakerStatus, CircuitBreaker, CircuitBreakerConfig};
use crate::core::{
    ArcTransport, CallContext, CallOutcome, CallRequest, CallResponse, FailureCause,
    PipelineError, Transport, TransportError,
};
use crate::pipeline::resolution::{CallResolution, ResolutionSource};
use crate::policy::{
    FallbackContext, FallbackPolicy, FallbackTrigger, OutcomeClassifier, RetryPolicy,
};

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Configuration for the call pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Classifier deciding which results count as handled failures.
    pub classifier: OutcomeClassifier,

    /// Retry policy for the innermost stage.
    pub retry: RetryPolicy,

    /// Circuit breaker configuration.
    pub breaker: CircuitBreakerConfig,

    /// Fallback policy for the outermost stage.
    pub fallback: FallbackPolicy,

    /// Timeout applied to each individual transport attempt.
    pub attempt_timeout: Option<std::time::Duration>,
}

impl PipelineConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outcome classifier.
    pub fn with_classifier(mut self, classifier: OutcomeClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the circuit breaker configuration.
    pub fn with_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    /// Sets the fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.breaker.validate()?;
        if self.attempt_timeout == Some(std::time::Duration::ZERO) {
            return Err(PipelineError::invalid_config(
                "attempt_timeout must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Builder for creating a `CallPipeline`.
pub struct CallPipelineBuilder {
    transport: Option<ArcTransport>,
    config: PipelineConfig,
}

impl CallPipelineBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            transport: None,
            config: PipelineConfig::default(),
        }
    }

    /// Sets the transport.
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets a transport already wrapped in an Arc.
    pub fn with_arc_transport(mut self, transport: ArcTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the outcome classifier.
    pub fn with_classifier(mut self, classifier: OutcomeClassifier) -> Self {
        self.config.classifier = classifier;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Sets the circuit breaker configuration.
    pub fn with_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.config.breaker = breaker;
        self
    }

    /// Sets the fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.config.fallback = fallback;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.attempt_timeout = Some(timeout);
        self
    }

    /// Sets the whole configuration at once.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the pipeline.
    pub fn build(self) -> Result<CallPipeline, PipelineError> {
        let transport = self
            .transport
            .ok_or_else(|| PipelineError::invalid_config("A transport is required"))?;
        self.config.validate()?;

        let breaker = CircuitBreaker::new(self.config.breaker.clone());

        Ok(CallPipeline {
            transport,
            config: self.config,
            breaker,
        })
    }
}

impl Default for CallPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The call pipeline that wraps a transport in resilience policies.
///
/// Stages are composed in a fixed order around the transport:
///
/// ```text
/// Fallback( CircuitBreaker( Retry( classified transport call ) ) )
/// ```
///
/// The retry stage re-invokes the transport on handled failures. The
/// breaker counts whole retried call sequences, rejecting new calls
/// while open. The fallback turns any remaining failure into a
/// substitute response, so [`execute`](CallPipeline::execute) either
/// delivers a response or fails with a terminal [`PipelineError`].
///
/// # Example
///
/// ```rust,ignore
/// use callguard::pipeline::CallPipeline;
/// use callguard::transport::MockTransport;
/// use callguard::core::{CallContext, CallRequest};
///
/// let pipeline = CallPipeline::builder()
///     .with_transport(MockTransport::new())
///     .build()?;
///
/// let request = CallRequest::get("https://api.example.com/items");
/// let resolution = pipeline.execute(request, CallContext::new()).await?;
/// println!("{}", resolution.summary());
/// ```
pub struct CallPipeline {
    /// The wrapped transport.
    transport: ArcTransport,
    /// Configuration.
    config: PipelineConfig,
    /// Circuit breaker shared by all executions.
    breaker: CircuitBreaker,
}

impl CallPipeline {
    /// Creates a new builder.
    pub fn builder() -> CallPipelineBuilder {
        CallPipelineBuilder::new()
    }

    /// Executes a call through every resilience stage.
    ///
    /// The returned resolution always carries a response, from the
    /// upstream or from the fallback. The only error cases are a failed
    /// fallback provider and configuration faults.
    pub async fn execute(
        &self,
        request: CallRequest,
        context: CallContext,
    ) -> Result<CallResolution, PipelineError> {
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::info!(
            method = %request.method,
            url = %request.url,
            transport = self.transport.name(),
            correlation_id = ?context.correlation_id,
            "Executing call"
        );

        let (outcome, attempts) = match self.breaker.admit() {
            Admission::Admitted(permit) => {
                let retried = self
                    .config
                    .retry
                    .run(&self.config.classifier, || self.attempt(&request))
                    .await;
                permit.record(&retried.outcome);
                (retried.outcome, retried.attempts)
            }
            Admission::Rejected { retry_after } => {
                tracing::warn!(
                    url = %request.url,
                    correlation_id = ?context.correlation_id,
                    "Circuit breaker is open"
                );
                let cause = FailureCause::CircuitOpen { retry_after };
                (CallOutcome::HandledFailure(cause), 0)
            }
        };

        let breaker_status = self.breaker.current_state();

        let (response, source) = match outcome {
            CallOutcome::Success(response) => {
                tracing::info!(
                    status = response.status,
                    attempts,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Call succeeded"
                );
                (response, ResolutionSource::Primary)
            }
            CallOutcome::HandledFailure(cause) => {
                self.substitute(&request, &context, FallbackTrigger::Handled(&cause), attempts)?
            }
            CallOutcome::UnhandledError(error) => {
                self.substitute(&request, &context, FallbackTrigger::Unhandled(&error), attempts)?
            }
        };

        let resolution = CallResolution::new(
            response,
            source,
            attempts,
            breaker_status,
            started_at,
            start.elapsed(),
            context,
        );

        crate::events::emit_call_resolved(&resolution);

        Ok(resolution)
    }

    /// Effective circuit state right now.
    ///
    /// Read-only; lets front-line code skip work the breaker would
    /// reject anyway.
    pub fn breaker_status(&self) -> BreakerStatus {
        self.breaker.current_state()
    }

    /// Returns a reference to the circuit breaker.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Returns a reference to the transport.
    pub fn transport(&self) -> &ArcTransport {
        &self.transport
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// One transport attempt, bounded by the per-attempt timeout.
    async fn attempt(&self, request: &CallRequest) -> Result<CallResponse, TransportError> {
        match self.config.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.transport.send(request)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::timeout(limit)),
            },
            None => self.transport.send(request).await,
        }
    }

    /// Turns a failed outcome into a substitute response.
    fn substitute(
        &self,
        request: &CallRequest,
        context: &CallContext,
        trigger: FallbackTrigger<'_>,
        attempts: u32,
    ) -> Result<(CallResponse, ResolutionSource), PipelineError> {
        let trigger_text = trigger.to_string();
        let fallback_ctx = FallbackContext {
            request,
            context,
            trigger,
        };

        match self.config.fallback.resolve(&fallback_ctx) {
            Ok(response) => {
                tracing::info!(
                    trigger = %trigger_text,
                    status = response.status,
                    attempts,
                    "Fallback policy executed"
                );
                Ok((
                    response,
                    ResolutionSource::Fallback {
                        trigger: trigger_text,
                    },
                ))
            }
            Err(error) => {
                tracing::error!(
                    trigger = %trigger_text,
                    error = %error,
                    "Fallback provider failed"
                );
                Err(PipelineError::fallback_failed(
                    error.to_string(),
                    trigger_text,
                ))
            }
        }
    }
}

impl std::fmt::Debug for CallPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallPipeline")
            .field("transport", &self.transport.name())
            .field("config", &self.config)
            .finish()
    }
}
