//! Call pipeline for orchestrating the resilience stages.
//!
//! The `CallPipeline` wraps a transport in retry, circuit breaking, and
//! fallback, delivering a [`CallResolution`] for every executed call.

mod call_pipeline;
mod resolution;

pub use call_pipeline::{CallPipeline, CallPipelineBuilder, PipelineConfig};
pub use resolution::{CallResolution, ResolutionSource};
