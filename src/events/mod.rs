//! Structured event logging for observability pipelines.
//!
//! This module provides functions for emitting structured call events
//! using the `tracing` crate. Events can be captured by any tracing
//! subscriber (JSON file, OpenTelemetry, etc.) for dashboards and alerts.

mod emit;

pub use emit::{emit_call_resolved, emit_call_started, CallResolvedEvent, PipelineEvent};
