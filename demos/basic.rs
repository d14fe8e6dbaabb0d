//! Basic example demonstrating per-identifier rate limiting.
//!
//! Each call site names a conditional. The first call configures it; later
//! calls reuse it. Accepted events report how many were suppressed before
//! them.

use std::thread;
use std::time::Duration;
use tracing_resist::{ConditionalRegistry, Log, LogEvent, Slip};

fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let registry: ConditionalRegistry<LogEvent> = ConditionalRegistry::new();

    println!("=== Basic Rate Limiting Example ===\n");
    println!("Conditional 'demo': at most 1 event per second\n");

    println!("Emitting 5 events in a burst:");
    for i in 1..=5 {
        Slip::of(Log::info().message("burst event").field("iteration", i))
            .id(&registry, "demo", |b| b.limit_rate(1))
            .expect("valid conditional")
            .log_with(|context, event| event.field("suppressed", context.suppressed()));
    }

    println!("\nWaiting one second, then emitting again:");
    thread::sleep(Duration::from_secs(1));
    Slip::of(Log::info().message("burst event").field("iteration", 6))
        .id(&registry, "demo", |b| b.limit_rate(1))
        .expect("valid conditional")
        .log_with(|context, event| event.field("suppressed", context.suppressed()));

    println!("\nTwo ids sharing one named limiter (2 per minute):");
    for id in ["reads", "writes", "reads", "writes"] {
        Slip::of(Log::warn().message("slow query").field("kind", id))
            .id(&registry, id, |b| {
                b.limit_named("database", 2, Duration::from_secs(60))
            })
            .expect("valid conditional")
            .log();
    }

    let snapshot = registry.metrics().snapshot();
    println!("\n=== Example Complete ===");
    println!(
        "accepted={} rejected={} suppression rate={:.0}%",
        snapshot.accepted,
        snapshot.rejected,
        snapshot.suppression_rate() * 100.0
    );
}
