//! Mock transport for testing.
//!
//! This module provides a configurable mock transport that can be used
//! in tests to script upstream behavior without a real HTTP endpoint.

use crate::core::{CallRequest, CallResponse, Transport, TransportError};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A mock transport for testing purposes.
///
/// Calls consume scripted results in order; once the script runs out,
/// every call answers with the default response. Errors can be scripted
/// anywhere in the sequence to simulate flaky upstreams.
///
/// # Examples
///
/// ```rust
/// use callguard::transport::MockTransport;
/// use callguard::core::{CallResponse, TransportError};
///
/// // A transport that always answers 404.
/// let transport = MockTransport::with_status(404);
///
/// // A transport that fails twice, then recovers.
/// let transport = MockTransport::new()
///     .fail_with(TransportError::connection_failed("refused"))
///     .fail_with(TransportError::connection_failed("refused"));
///
/// // A transport that walks through scripted responses.
/// let transport = MockTransport::new()
///     .respond_with(CallResponse::new(503))
///     .respond_with(CallResponse::ok());
/// ```
#[derive(Debug)]
pub struct MockTransport {
    /// Name of this transport instance.
    name: String,
    /// Scripted results, consumed front to back.
    script: Mutex<VecDeque<Result<CallResponse, TransportError>>>,
    /// Response for calls past the end of the script.
    default_response: CallResponse,
    /// Simulated latency per call.
    latency: Option<Duration>,
    /// Counter for send operations.
    call_count: AtomicU64,
}

impl MockTransport {
    /// Creates a new mock transport answering 200 OK.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(VecDeque::new()),
            default_response: CallResponse::ok(),
            latency: None,
            call_count: AtomicU64::new(0),
        }
    }

    /// Creates a mock transport that always answers with the given status.
    pub fn with_status(status: u16) -> Self {
        Self {
            default_response: CallResponse::new(status),
            ..Self::new()
        }
    }

    /// Sets the name of this transport.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the response for calls past the end of the script.
    pub fn with_default_response(mut self, response: CallResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Sets the simulated latency for calls.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Appends a scripted response.
    pub fn respond_with(self, response: CallResponse) -> Self {
        self.script.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Appends a scripted transport error.
    pub fn fail_with(self, error: TransportError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Appends a scripted response after construction.
    pub fn push_response(&self, response: CallResponse) {
        self.script.lock().unwrap().push_back(Ok(response));
    }

    /// Appends a scripted transport error after construction.
    pub fn push_error(&self, error: TransportError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Returns the number of calls made.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Returns how many scripted results remain.
    pub fn remaining_script(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, _request: &CallRequest) -> Result<CallResponse, TransportError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(self.default_response.clone()),
        }
    }
}
