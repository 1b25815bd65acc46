//! Custom transport example.
//!
//! This example shows how to:
//! - Implement the Transport trait for your own call mechanism
//! - Classify which responses count as failures
//! - Shape the fallback response from the fallback context
//!
//! Run with: cargo run --example custom_transport

use async_trait::async_trait;
use callguard::policy::FallbackContext;
use callguard::prelude::*;
use std::collections::HashMap;

/// A transport that serves canned responses from an in-memory routing
/// table. Useful for contract tests and local development against an
/// API that is not deployed yet.
#[derive(Debug)]
struct RoutingTableTransport {
    name: String,
    routes: HashMap<String, CallResponse>,
}

impl RoutingTableTransport {
    fn new() -> Self {
        Self {
            name: "routing-table".to_string(),
            routes: HashMap::new(),
        }
    }

    /// Registers a canned response for a path.
    fn with_route(mut self, path: impl Into<String>, response: CallResponse) -> Self {
        self.routes.insert(path.into(), response);
        self
    }

    #[allow(dead_code)]
    fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Extracts the path component of a URL.
    fn path_of(url: &str) -> &str {
        let rest = url.split("://").nth(1).unwrap_or(url);
        match rest.find('/') {
            Some(idx) => &rest[idx..],
            None => "/",
        }
    }
}

#[async_trait]
impl Transport for RoutingTableTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: &CallRequest) -> Result<CallResponse, TransportError> {
        let path = Self::path_of(&request.url);
        tracing::debug!(path = %path, "Routing table lookup");

        match self.routes.get(path) {
            Some(response) => Ok(response.clone()),
            None => Ok(CallResponse::not_found()
                .with_header("content-type", "application/json")
                .with_body(format!(r#"{{"error":"no route for {}"}}"#, path))),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Callguard Custom Transport Example ===\n");

    // Build the routing table: one healthy route, one degraded route
    let transport = RoutingTableTransport::new()
        .with_route(
            "/api/items",
            CallResponse::ok()
                .with_header("content-type", "application/json")
                .with_body(r#"{"items":["alpha","beta"]}"#),
        )
        .with_route("/api/reports", CallResponse::new(503));

    // Treat server errors and 404s as handled failures
    let classifier = OutcomeClassifier::new(
        ResponseMatcher::ServerError.or(ResponseMatcher::status(404)),
    );

    // Shape the substitute response from the fallback context
    let fallback = FallbackPolicy::from_fn(|ctx: &FallbackContext<'_>| {
        let body = format!(
            r#"{{"degraded":true,"requested":"{}","trigger":"{}"}}"#,
            ctx.request.url, ctx.trigger
        );
        Ok(CallResponse::ok()
            .with_header("content-type", "application/json")
            .with_body(body))
    });

    let pipeline = CallPipeline::builder()
        .with_transport(transport)
        .with_classifier(classifier)
        .with_retry(RetryPolicy::no_retry())
        .with_fallback(fallback)
        .build()?;

    // A registered route answers directly
    println!("--- Known route ---");
    let resolution = pipeline
        .execute(
            CallRequest::get("https://api.example.com/api/items"),
            CallContext::new().with_caller("catalog-service"),
        )
        .await?;
    println!("✅ {}", resolution.summary());
    println!("  Body: {}\n", resolution.response.body_text());

    // A degraded route is flagged by the classifier and substituted
    println!("--- Degraded route (503) ---");
    let resolution = pipeline
        .execute(
            CallRequest::get("https://api.example.com/api/reports"),
            CallContext::new().with_caller("catalog-service"),
        )
        .await?;
    println!("⚠️ {}", resolution.summary());
    println!("  Body: {}\n", resolution.response.body_text());

    // A missing route returns 404, which the classifier also flags
    println!("--- Missing route ---");
    let resolution = pipeline
        .execute(
            CallRequest::get("https://api.example.com/api/nope"),
            CallContext::new().with_caller("catalog-service"),
        )
        .await?;
    println!("⚠️ {}", resolution.summary());
    println!("  Body: {}", resolution.response.body_text());

    println!("\n=== Example Complete ===");
    Ok(())
}
