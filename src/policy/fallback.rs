//! Fallback substitution.
//!
//! The fallback is the outermost stage: whatever the inner stages resolve
//! to, the caller receives either the genuine response or the fallback's
//! substitute. It engages for handled failures and unhandled errors
//! alike; only a failing provider escapes it, as a terminal pipeline
//! error.

use crate::core::outcome::FailureCause;
use crate::core::types::{CallContext, CallRequest, CallResponse};
use crate::core::TransportError;

use std::fmt;
use std::sync::Arc;

/// What the fallback is substituting for.
#[derive(Debug)]
pub enum FallbackTrigger<'a> {
    /// The inner stages resolved to a handled failure.
    Handled(&'a FailureCause),

    /// The inner stages resolved to an unhandled transport error.
    Unhandled(&'a TransportError),
}

impl FallbackTrigger<'_> {
    /// Returns `true` if the trigger is a breaker rejection.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::Handled(cause) if cause.is_circuit_open())
    }
}

impl fmt::Display for FallbackTrigger<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handled(cause) => write!(f, "{cause}"),
            Self::Unhandled(error) => write!(f, "unhandled error: {error}"),
        }
    }
}

/// Context handed to the fallback provider.
///
/// Carries enough for the provider to shape its substitute: the original
/// request, the caller's context, and why the fallback engaged.
#[derive(Debug)]
pub struct FallbackContext<'a> {
    /// The request the pipeline was executing.
    pub request: &'a CallRequest,

    /// The caller-supplied context.
    pub context: &'a CallContext,

    /// Why the fallback engaged.
    pub trigger: FallbackTrigger<'a>,
}

type FallbackFn =
    Arc<dyn Fn(&FallbackContext<'_>) -> Result<CallResponse, TransportError> + Send + Sync>;

/// Produces the substitute response when the inner stages fail.
///
/// The default provider returns a synthetic 200 OK, so callers always
/// get a well-formed response. Providers must be cheap and reliable; a
/// provider error is a terminal
/// [`PipelineError::FallbackFailed`](crate::core::PipelineError::FallbackFailed).
#[derive(Clone)]
pub struct FallbackPolicy {
    provider: FallbackFn,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::synthetic_ok()
    }
}

impl fmt::Debug for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackPolicy").finish_non_exhaustive()
    }
}

impl FallbackPolicy {
    /// A provider returning a synthetic 200 OK with no body.
    pub fn synthetic_ok() -> Self {
        Self {
            provider: Arc::new(|_| Ok(CallResponse::ok())),
        }
    }

    /// A provider returning a clone of the given response.
    pub fn fixed(response: CallResponse) -> Self {
        Self {
            provider: Arc::new(move |_| Ok(response.clone())),
        }
    }

    /// A provider computed from the fallback context.
    pub fn from_fn<F>(provider: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> Result<CallResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Invokes the provider for the given context.
    pub fn resolve(&self, ctx: &FallbackContext<'_>) -> Result<CallResponse, TransportError> {
        (self.provider)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_for<'a>(
        request: &'a CallRequest,
        context: &'a CallContext,
        cause: &'a FailureCause,
    ) -> FallbackContext<'a> {
        FallbackContext {
            request,
            context,
            trigger: FallbackTrigger::Handled(cause),
        }
    }

    #[test]
    fn test_synthetic_ok_default() {
        let request = CallRequest::get("https://api.example.com/items");
        let call_context = CallContext::new();
        let cause = FailureCause::Response(CallResponse::not_found());

        let policy = FallbackPolicy::default();
        let response = policy
            .resolve(&context_for(&request, &call_context, &cause))
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_fixed_response() {
        let request = CallRequest::get("https://api.example.com/items");
        let call_context = CallContext::new();
        let cause = FailureCause::CircuitOpen { retry_after: None };

        let policy = FallbackPolicy::fixed(CallResponse::new(203).with_body("cached"));
        let response = policy
            .resolve(&context_for(&request, &call_context, &cause))
            .unwrap();

        assert_eq!(response.status, 203);
        assert_eq!(response.body_text(), "cached");
    }

    #[test]
    fn test_provider_sees_trigger() {
        let request = CallRequest::get("https://api.example.com/items");
        let call_context = CallContext::new();
        let cause = FailureCause::CircuitOpen { retry_after: None };

        let policy = FallbackPolicy::from_fn(|ctx| {
            let body = if ctx.trigger.is_circuit_open() {
                "circuit open"
            } else {
                "upstream failed"
            };
            Ok(CallResponse::ok().with_body(body))
        });

        let response = policy
            .resolve(&context_for(&request, &call_context, &cause))
            .unwrap();
        assert_eq!(response.body_text(), "circuit open");
    }

    #[test]
    fn test_provider_error_surfaces() {
        let request = CallRequest::get("https://api.example.com/items");
        let call_context = CallContext::new();
        let cause = FailureCause::Response(CallResponse::not_found());

        let policy =
            FallbackPolicy::from_fn(|_| Err(TransportError::other("template store offline")));
        let result = policy.resolve(&context_for(&request, &call_context, &cause));

        assert!(result.is_err());
    }
}
