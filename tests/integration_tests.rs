use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_resist::infrastructure::mocks::{MockCaptureLayer, MockClock};
use tracing_resist::{ConditionalRegistry, Log, LogEvent, Slip};
use tracing_subscriber::layer::SubscriberExt;

fn with_capture<F: FnOnce()>(f: F) -> MockCaptureLayer {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

fn mock_registry() -> (Arc<MockClock>, ConditionalRegistry<LogEvent>) {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let registry = ConditionalRegistry::builder()
        .with_clock(clock.clone())
        .build();
    (clock, registry)
}

/// Capture only events emitted through `LogEvent`, not the crate's own
/// diagnostics.
fn emitted(capture: &MockCaptureLayer) -> Vec<tracing_resist::infrastructure::mocks::CapturedEvent> {
    capture
        .get_captured()
        .into_iter()
        .filter(|e| e.message.starts_with("tick") || e.message.starts_with("query"))
        .collect()
}

#[test]
fn test_one_per_second_emits_first_of_burst() {
    let (_clock, registry) = mock_registry();

    let capture = with_capture(|| {
        for i in 0..5 {
            Slip::of(Log::info().message(format!("tick {}", i)))
                .id(&registry, "demo", |b| b.limit_rate(1))
                .unwrap()
                .log();
        }
    });

    let events = emitted(&capture);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "tick 0");
    assert_eq!(events[0].level, Level::INFO);

    let context = registry.get("demo").unwrap().context().clone();
    assert_eq!(context.accepted(), 1);
    assert_eq!(context.rejected(), 4);
}

#[test]
fn test_next_accepted_event_reports_suppressed_run() {
    let (clock, registry) = mock_registry();

    let capture = with_capture(|| {
        for _ in 0..4 {
            Slip::of(Log::warn().message("tick"))
                .id(&registry, "report", |b| b.limit_rate(1))
                .unwrap()
                .log_with(|context, event| event.field("suppressed", context.suppressed()));
        }

        clock.advance(Duration::from_secs(1));

        Slip::of(Log::warn().message("tick"))
            .id(&registry, "report", |b| b.limit_rate(1))
            .unwrap()
            .log_with(|context, event| event.field("suppressed", context.suppressed()));
    });

    let events = emitted(&capture);
    assert_eq!(events.len(), 2);
    assert!(events[0].has_field("fields", "suppressed=0"));
    assert!(events[1].has_field("fields", "suppressed=3"));
}

#[test]
fn test_named_limiter_one_per_five_seconds() {
    let (clock, registry) = mock_registry();

    let capture = with_capture(|| {
        for i in 0..10 {
            clock.advance(Duration::from_millis(100));
            Slip::of(Log::debug().message("query").field("n", i))
                .id(&registry, "slow-query", |b| {
                    b.limit_named("db", 1, Duration::from_secs(5))
                })
                .unwrap()
                .log();
        }
    });

    assert_eq!(emitted(&capture).len(), 1);
    let state = registry.get("slow-query").unwrap().context().state();
    assert_eq!(state.accept_count(), 1);
    assert_eq!(state.reject_count(), 9);
}

#[test]
fn test_named_limiter_shared_between_ids() {
    let (_clock, registry) = mock_registry();

    let capture = with_capture(|| {
        for id in ["reads", "writes", "reads", "writes"] {
            Slip::of(Log::info().message(format!("query {}", id)))
                .id(&registry, id, |b| b.limit_named("db", 2, Duration::from_secs(60)))
                .unwrap()
                .log();
        }
    });

    assert_eq!(emitted(&capture).len(), 2);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.rate_limiters().len(), 1);
}

#[test]
fn test_ids_limited_independently() {
    let (_clock, registry) = mock_registry();

    let capture = with_capture(|| {
        for id in ["a", "b", "c"] {
            for _ in 0..3 {
                Slip::of(Log::info().message("tick"))
                    .id(&registry, id, |b| b.limit_rate(1))
                    .unwrap()
                    .log();
            }
        }
    });

    assert_eq!(emitted(&capture).len(), 3);
    let snapshot = registry.metrics().snapshot();
    assert_eq!(snapshot.accepted, 3);
    assert_eq!(snapshot.rejected, 6);
    assert_eq!(snapshot.conditionals_created, 3);
}

#[test]
fn test_predicate_and_rate_limit() {
    let (_clock, registry) = mock_registry();

    let capture = with_capture(|| {
        for status in [200, 500, 404, 503, 500] {
            Slip::of(Log::error().message("tick").field("status", status))
                .id(&registry, "errors", |b| {
                    b.limit(|event: &LogEvent| {
                        event
                            .fields()
                            .iter()
                            .any(|(k, v)| k == "status" && v.starts_with('5'))
                    })
                    .limit_rate(2)
                })
                .unwrap()
                .log();
        }
    });

    let events = emitted(&capture);
    assert_eq!(events.len(), 2);
    assert!(events[0].has_field("fields", "status=500"));
    assert!(events[1].has_field("fields", "status=503"));
}

#[test]
fn test_nop_slip_never_filters() {
    let capture = with_capture(|| {
        for _ in 0..3 {
            Slip::of(Log::info().message("tick")).nop().log();
        }
    });

    assert_eq!(emitted(&capture).len(), 3);
}

#[test]
fn test_summaries_after_quiet_period() {
    let (_clock, registry) = mock_registry();

    for _ in 0..6 {
        registry
            .evaluate("burst", Log::info().message("tick"), |b| b.limit_rate(1))
            .unwrap();
    }

    let summaries = registry.summaries(1);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, "burst");
    assert_eq!(summaries[0].pending(), 5);
    assert!(summaries[0].format_message().contains("5 events suppressed"));
}
