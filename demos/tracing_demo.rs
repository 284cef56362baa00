//! Demonstrates tracing integration with pipes
//!
//! Run with: cargo run --example tracing_demo --features tracing

use std::time::Duration;

use pipewater::prelude::*;
use pipewater::testing::Flaky;
use serde_json::json;

#[tokio::main]
async fn main() {
    // Set up tracing subscriber
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    tracing::info!("Starting tracing demo");

    let host = TokioHost::new(
        HostConfig::default()
            .with_retry_interval(Duration::from_millis(10))
            .with_max_retry_interval(Duration::from_millis(80)),
    );

    // Fails three rounds, then settles
    let flaky = Flaky::new(3, json!("ready"));
    match pipe(&host, (), flaky, PipeOptions::default(), None).await {
        Ok(value) => tracing::info!("Pipe settled: {}", value),
        Err(e) => tracing::error!("Pipe failed: {}", e),
    }

    // Never settles
    let result = Chain::wrap(&host, json!({ "foo": "bar" }))
        .pipe(|obj: &serde_json::Value| Ok::<_, String>(obj["foo"].clone()))
        .with_timeout(Duration::from_millis(200))
        .should(equal(json!("baz")))
        .await;
    if let Err(e) = result {
        tracing::error!(attempts = e.attempts, "Chain failed: {}", e);
    }

    tracing::info!("{} log records written", host.logs().len());
}
