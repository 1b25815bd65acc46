//! Transport implementations.
//!
//! This module contains implementations of the `Transport` trait that
//! actually move requests to an upstream.
//!
//! ## Available Transports
//!
//! - [`mock`] - A scriptable transport for testing
//! - [`http`] - Real HTTP calls via `reqwest` (requires `http` feature)
//!
//! ## Implementing a Custom Transport
//!
//! To wrap another client or protocol, implement the `Transport` trait:
//!
//! ```rust,ignore
//! use callguard::core::{CallRequest, CallResponse, Transport, TransportError};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct MyTransport {
//!     // Your client handle
//! }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     fn name(&self) -> &str {
//!         "my-transport"
//!     }
//!
//!     async fn send(&self, request: &CallRequest) -> Result<CallResponse, TransportError> {
//!         // Perform the call; Ok for any complete response,
//!         // Err only when no response was obtained.
//!         todo!()
//!     }
//! }
//! ```

pub mod mock;

#[cfg(feature = "http")]
pub mod http;

// Re-exports
pub use mock::MockTransport;

#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportConfig};
