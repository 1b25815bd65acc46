//! Core traits for the callguard library.
//!
//! This module defines the `Transport` trait that all call backends must
//! implement. The resilience pipeline is generic over this seam: anything
//! that can perform one attempt of an outbound call can be wrapped.

use crate::core::error::TransportError;
use crate::core::types::{CallRequest, CallResponse};

use async_trait::async_trait;
use std::fmt::Debug;

/// The core trait for outbound call backends.
///
/// A transport performs exactly one attempt per `send` invocation. All
/// retrying, breaking, and substitution happens above this seam, so
/// implementations stay small: translate the request, perform it, and
/// translate the answer back.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync` for use in async contexts.
/// - `send` must return a [`CallResponse`] for any complete upstream
///   answer, including 4xx/5xx statuses. Reserve `Err` for attempts that
///   produced no well-formed response at all.
/// - Implementations should never panic; all failures are returned as
///   `TransportError`.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use callguard::core::{CallRequest, CallResponse, Transport, TransportError};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct MyTransport {
///     name: String,
/// }
///
/// #[async_trait]
/// impl Transport for MyTransport {
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     async fn send(&self, request: &CallRequest) -> Result<CallResponse, TransportError> {
///         // Perform the call...
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Returns the name of this transport.
    ///
    /// This should be a stable, human-readable identifier like "reqwest"
    /// or "mock", used in telemetry.
    fn name(&self) -> &str;

    /// Performs one attempt of the given request.
    ///
    /// # Arguments
    ///
    /// * `request` - The outbound call to attempt.
    ///
    /// # Returns
    ///
    /// * `Ok(CallResponse)` - The upstream produced a complete response,
    ///   whatever its status code.
    /// * `Err(TransportError)` - The attempt produced no response.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` for the usual failure modes:
    /// - `Timeout` - The attempt exceeded its deadline.
    /// - `ConnectionFailed` / `Dns` / `Tls` - The upstream was unreachable.
    /// - `InvalidRequest` - The request could not be constructed or sent.
    async fn send(&self, request: &CallRequest) -> Result<CallResponse, TransportError>;
}

/// A boxed transport for type-erased storage.
pub type BoxedTransport = Box<dyn Transport>;

/// An arc-wrapped transport for shared ownership.
pub type ArcTransport = std::sync::Arc<dyn Transport>;
