//! Example demonstrating periodic summaries of suppressed events.
//!
//! Identifiers that go quiet after a burst never emit an accepted event that
//! could report the suppressed run. The summary emitter reports them instead.

use std::time::Duration;
use tracing_resist::{
    log_summaries, ConditionalRegistry, EmitterConfig, Log, LogEvent, Slip, SummaryEmitter,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    println!("=== Suppression Summary Example ===\n");

    let registry: ConditionalRegistry<LogEvent> = ConditionalRegistry::new();
    let config = EmitterConfig::new(Duration::from_secs(1))
        .expect("non-zero interval")
        .with_min_count(1);
    let handle = SummaryEmitter::new(registry.clone(), config).start(log_summaries);

    println!("Emitting 20 login events and 15 database errors:");
    for _ in 1..=20 {
        Slip::of(Log::info().message("User login successful").field("user_id", "user_123"))
            .id(&registry, "login", |b| b.limit_rate(2))
            .expect("valid conditional")
            .log();
    }
    for _ in 1..=15 {
        Slip::of(Log::error().message("Database connection timeout"))
            .id(&registry, "db-timeout", |b| b.limit_rate(1))
            .expect("valid conditional")
            .log();
    }

    println!("\nWaiting for the summary emitter:");
    tokio::time::sleep(Duration::from_millis(1500)).await;

    if let Err(e) = handle.shutdown().await {
        eprintln!("emitter did not stop cleanly: {}", e);
    }

    println!("\n=== Example Complete ===");
}
