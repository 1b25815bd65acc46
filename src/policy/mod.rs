//! Resilience policies for outbound calls.
//!
//! Each policy is independently usable; the pipeline composes them in a
//! fixed order. The classifier decides what counts as a failure, the
//! retry policy re-attempts handled failures, and the fallback policy
//! substitutes a response when everything else has failed.

mod classifier;
mod fallback;
mod retry;

pub use classifier::{OutcomeClassifier, ResponseMatcher, TransportMatcher};
pub use fallback::{FallbackContext, FallbackPolicy, FallbackTrigger};
pub use retry::{RetryOutcome, RetryPolicy};
