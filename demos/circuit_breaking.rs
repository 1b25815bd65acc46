//! Circuit breaking example.
//!
//! This example shows how to:
//! - Configure the circuit breaker's threshold and break window
//! - Watch the circuit open and short-circuit calls
//! - Observe transition hooks
//! - Recover through a half-open probe
//! - Force transitions administratively
//!
//! Run with: cargo run --example circuit_breaking

use callguard::circuit_breaker::BreakerHooks;
use callguard::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Callguard Circuit Breaking Example ===\n");

    // Keep a handle to the upstream so we can heal it later
    let upstream = Arc::new(MockTransport::with_status(404).with_name("billing-api"));

    // Hooks observe state transitions on the call path
    let hooks = BreakerHooks::new()
        .on_open(|window| println!("  🔴 hook: circuit opened for {:?}", window))
        .on_half_open(|| println!("  🟡 hook: circuit half open, probing"))
        .on_reset(|| println!("  🟢 hook: circuit reset"));

    let breaker_config = CircuitBreakerConfig::new()
        .with_failure_threshold(2)
        .with_break_duration(Duration::from_secs(2))
        .with_hooks(hooks);

    let pipeline = CallPipeline::builder()
        .with_arc_transport(upstream.clone())
        .with_retry(
            RetryPolicy::new()
                .with_max_retries(1)
                .with_initial_delay(Duration::from_millis(100)),
        )
        .with_breaker(breaker_config)
        .build()?;

    // Phase 1: the upstream answers 404 until the circuit trips
    println!("--- Calling a failing upstream ---\n");

    for i in 1..=6 {
        // Check the breaker up front to skip calls that would be rejected
        if pipeline.breaker_status() == BreakerStatus::Open {
            println!("Call {}: ⏭  skipped, circuit is open", i);
        } else {
            let resolution = pipeline
                .execute(
                    CallRequest::get("https://billing.example.com/invoices/42"),
                    CallContext::new().with_caller("orders-service"),
                )
                .await?;

            println!(
                "Call {}: {} via {} after {} attempt(s)",
                i,
                resolution.status(),
                resolution.source,
                resolution.attempts
            );
        }

        println!("  breaker: {}", pipeline.breaker_status());
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    // Phase 2: wait out the break window, heal the upstream, and let a
    // probe close the circuit
    println!("\n--- Waiting for the break window to elapse ---\n");
    tokio::time::sleep(Duration::from_millis(2200)).await;

    println!("Breaker now reads: {}", pipeline.breaker_status());

    upstream.push_response(
        CallResponse::ok()
            .with_header("content-type", "application/json")
            .with_body(r#"{"invoice":"42","total":129.50}"#),
    );

    let resolution = pipeline
        .execute(
            CallRequest::get("https://billing.example.com/invoices/42"),
            CallContext::new().with_caller("orders-service"),
        )
        .await?;

    println!("Probe call: {}", resolution.summary());
    println!("Breaker after probe: {}", pipeline.breaker_status());

    // Phase 3: what the breaker saw
    let metrics = pipeline.breaker().metrics();
    println!("\n=== Breaker Metrics ===");
    println!("Total calls: {}", metrics.total_calls);
    println!("Successful: {}", metrics.successful_calls);
    println!("Failed: {}", metrics.failed_calls);
    println!("Rejected: {}", metrics.rejected_calls);
    println!("Probes: {}", metrics.probe_calls);
    println!("Times opened: {}", metrics.times_opened);
    println!("Times closed: {}", metrics.times_closed);

    // Phase 4: forced transitions bypass the state machine (and its hooks)
    println!("\n--- Forced transitions ---\n");

    pipeline.breaker().force_open();
    println!("After force_open: {}", pipeline.breaker_status());

    pipeline.breaker().reset();
    println!(
        "After reset: {} ({} total calls on the counters)",
        pipeline.breaker_status(),
        pipeline.breaker().metrics().total_calls
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
