//! Core types and traits for the callguard library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`types`] - The request/response model and `CallContext`
//! - [`traits`] - The `Transport` trait
//! - [`error`] - Structured error types
//! - [`outcome`] - Classified call outcomes

pub mod error;
pub mod outcome;
pub mod traits;
pub mod types;

// Re-export commonly used types at the core level
pub use error::{PipelineError, PipelineResult, TransportError, TransportResult};
pub use outcome::{CallOutcome, FailureCause};
pub use traits::{ArcTransport, BoxedTransport, Transport};
pub use types::{CallContext, CallRequest, CallResponse, HttpMethod};
