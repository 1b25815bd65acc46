//! Basic call example demonstrating the resilience pipeline.
//!
//! This example shows how to:
//! - Create a transport
//! - Build a CallPipeline
//! - Execute a call and handle the resolution
//!
//! Run with: cargo run --example basic_call

use callguard::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Callguard Basic Call Example ===\n");

    // Create a mock transport that answers 200 OK (swap in HttpTransport
    // with the `http` feature for real calls)
    let transport = MockTransport::new().with_name("orders-api");

    // Build the pipeline with default policies
    let pipeline = CallPipeline::builder().with_transport(transport).build()?;

    // Create a request and a context with call metadata
    let request = CallRequest::get("https://api.example.com/orders/42");
    let context = CallContext::new()
        .with_correlation_id("req-456")
        .with_caller("checkout-service")
        .with_source("api");

    println!("Executing: {}", request);

    let resolution = pipeline.execute(request, context).await?;

    // Handle the result
    println!("\n=== Call Results ===");
    println!("Resolution ID: {}", resolution.id);
    println!("Status: {} {}", resolution.status(), resolution.response.status_label());
    println!("Attempts: {}", resolution.attempts);
    println!("Duration: {:?}", resolution.duration);
    println!("Breaker: {}", resolution.breaker_status);

    match &resolution.source {
        ResolutionSource::Primary => {
            println!("\n✅ The upstream answered directly");
        }
        ResolutionSource::Fallback { trigger } => {
            println!("\n⚠️ The fallback answered");
            println!("  Trigger: {}", trigger);
        }
    }

    // Demonstrate a call against a broken endpoint
    println!("\n\n=== Calling a Broken Endpoint ===\n");

    let broken_transport = MockTransport::with_status(404).with_name("orders-api");

    // Keep the demo snappy: short waits instead of the default 2s/4s
    let failing_pipeline = CallPipeline::builder()
        .with_transport(broken_transport)
        .with_retry(
            RetryPolicy::new()
                .with_max_retries(2)
                .with_initial_delay(Duration::from_millis(200)),
        )
        .build()?;

    let request = CallRequest::get("https://api.example.com/orders/missing");
    let resolution = failing_pipeline.execute(request, CallContext::new()).await?;

    println!("Summary: {}", resolution.summary());
    if resolution.is_fallback() {
        println!("⚠️ All {} attempts were flagged; the fallback substituted a response", resolution.attempts);
        println!("  Trigger: {}", resolution.source.trigger().unwrap_or("unknown"));
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
