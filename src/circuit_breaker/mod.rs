//! Circuit breaker implementation for call resilience.
//!
//! The circuit breaker pattern prevents hammering a failing upstream by
//! rejecting calls outright for a break window and then probing with a
//! single call to detect recovery.
//!
//! ## States
//!
//! - **Closed**: Normal operation; calls pass through.
//! - **Open**: Upstream is failing; calls are rejected immediately.
//! - **Half-Open**: A single probe call checks whether it has recovered.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use callguard::circuit_breaker::{Admission, CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::default()
//!     .with_failure_threshold(5)
//!     .with_break_duration(Duration::from_secs(30));
//!
//! let breaker = CircuitBreaker::new(config);
//! ```

mod breaker;
mod config;
mod state;

pub use breaker::{Admission, CallPermit, CircuitBreaker};
pub use config::{BreakerHooks, CircuitBreakerConfig};
pub use state::{BreakerMetrics, BreakerState, BreakerStatus};
