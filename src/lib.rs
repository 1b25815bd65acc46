//! # Callguard
//!
//! A resilience layer for outbound HTTP calls with retry, circuit
//! breaking, and fallback, plus structured event logging.
//!
//! ## Overview
//!
//! Callguard wraps a single outbound call in composable fault-tolerance
//! policies, allowing you to:
//!
//! - Execute calls through a consistent pipeline API
//! - Retry handled failures with exponential backoff
//! - Stop hammering a failing upstream with a circuit breaker
//! - Substitute a fallback response so callers always get an answer
//! - Classify which responses and errors count as failures
//! - Emit structured events for dashboards and alerting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use callguard::{CallContext, CallPipeline, CallRequest};
//! use callguard::transport::MockTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a transport (use HttpTransport for real calls)
//!     let transport = MockTransport::with_status(404);
//!
//!     // Create the pipeline with default policies
//!     let pipeline = CallPipeline::builder()
//!         .with_transport(transport)
//!         .build()?;
//!
//!     // Execute a call
//!     let request = CallRequest::get("https://api.example.com/items");
//!     let resolution = pipeline.execute(request, CallContext::new()).await?;
//!
//!     if resolution.is_fallback() {
//!         println!("Upstream failed; the fallback answered");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Core pipeline with the mock transport only
//! - `http` - Real HTTP transport via reqwest
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Core**: Fundamental types, traits, and error handling
//! - **Transport**: The things that actually move requests upstream
//! - **Policy**: Classifier, retry, and fallback stages
//! - **Circuit Breaker**: Admission control for failing upstreams
//! - **Pipeline**: Orchestration of the stages around one transport
//! - **Events**: Structured logging for observability

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod circuit_breaker;
pub mod core;
pub mod events;
pub mod pipeline;
pub mod policy;
pub mod transport;

// Re-export commonly used types at the crate root
pub use crate::core::{
    CallContext, CallOutcome, CallRequest, CallResponse, FailureCause, HttpMethod, PipelineError,
    Transport, TransportError,
};

pub use crate::circuit_breaker::{BreakerStatus, CircuitBreaker, CircuitBreakerConfig};
pub use crate::pipeline::{CallPipeline, CallResolution, PipelineConfig, ResolutionSource};
pub use crate::policy::{FallbackPolicy, OutcomeClassifier, ResponseMatcher, RetryPolicy};

/// Prelude module for convenient imports.
///
/// ```rust
/// use callguard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        CallContext, CallOutcome, CallRequest, CallResponse, FailureCause, HttpMethod,
        PipelineError, Transport, TransportError,
    };
    pub use crate::circuit_breaker::{BreakerStatus, CircuitBreaker, CircuitBreakerConfig};
    pub use crate::pipeline::{CallPipeline, CallResolution, PipelineConfig, ResolutionSource};
    pub use crate::policy::{FallbackPolicy, OutcomeClassifier, ResponseMatcher, RetryPolicy};
    pub use crate::transport::MockTransport;
}
