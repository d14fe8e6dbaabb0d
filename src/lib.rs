//! # tracing-resist
//!
//! Per-identifier, rate-limited, conditional logging for the `tracing` ecosystem.
//!
//! Each log call site names a *conditional*. The first time an identifier is
//! seen, the conditional is configured (rate limits, predicates); every later
//! call reuses it. Accepted events are emitted, rejected ones are replaced by a
//! no-op event. Every evaluation updates lock-free accept/reject/suppressed
//! counters that the call site can read while emitting, so the next event
//! that gets through can report how many were dropped before it.
//!
//! ## Quick Start
//!
//! ```rust
//! use tracing_resist::{ConditionalRegistry, Log, LogEvent, Slip};
//!
//! let registry: ConditionalRegistry<LogEvent> = ConditionalRegistry::new();
//!
//! for attempt in 0..100 {
//!     Slip::of(Log::warn().message("upstream timed out").field("attempt", attempt))
//!         .id(&registry, "upstream-timeout", |b| b.limit_rate(1))
//!         .expect("valid conditional")
//!         .log_with(|context, event| event.field("suppressed", context.suppressed()));
//! }
//!
//! let context = registry.get("upstream-timeout").unwrap().context().clone();
//! assert_eq!(context.accepted() + context.rejected(), 100);
//! ```
//!
//! ## Conditionals
//!
//! A `Conditional` can also be built directly, over any candidate and result
//! types:
//!
//! ```rust
//! use tracing_resist::{Conditional, Context, RateLimiterRegistry};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let limiters = RateLimiterRegistry::new();
//! let conditional = Conditional::<Arc<Context>, &str, String>::builder()
//!     .context(Context::shared())
//!     .transformation(|s: &str| s.to_uppercase())
//!     .neutral_source(String::new)
//!     .on_accept(|c: &Arc<Context>| { c.on_accept(); })
//!     .on_reject(|c: &Arc<Context>| { c.on_reject(); })
//!     .rate_limiters(limiters)
//!     .limit(|s: &&str| !s.is_empty())
//!     .limit_named("shared-db", 10, Duration::from_secs(60))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(conditional.evaluate("ok").into_result(), "OK");
//! assert_eq!(conditional.evaluate("").into_result(), "");
//! assert_eq!(conditional.context().rejected(), 1);
//! ```
//!
//! Clauses are AND-ed in the order they are configured and evaluation stops
//! at the first failing one, so a rate limiter placed after a predicate only
//! spends permits on candidates the predicate let through.
//!
//! ## Rate Limiters
//!
//! Limiters are singletons by name inside a `RateLimiterRegistry`. `limit_rate(n)`
//! allows `n` events per second under the conditional's own id; `limit_named`
//! shares one limiter between every conditional using the same name. The first
//! conditional to create a name decides its quota. Acquisition never waits.
//!
//! ## Statistics
//!
//! `Context` holds an immutable `State` snapshot behind an atomic pointer and
//! updates it with a compare-and-swap loop:
//!
//! - `accepted()` / `rejected()` - totals
//! - `suppressed()` - rejects right before the most recent accept
//! - `pending_suppressed()` - rejects since the most recent accept
//!
//! Registries also keep aggregate `Metrics`, and `SummaryEmitter` reports
//! identifiers whose suppressed runs are still open. With the `async` feature
//! the emitter can run periodically on a tokio task.

// Domain layer - pure values
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    quota::{Quota, QuotaError},
    state::{Decision, State},
    summary::SuppressionSummary,
};

pub use application::{
    conditional::{BuildError, Conditional, ConditionalBuilder},
    context::Context,
    emitter::{log_summaries, EmitterConfig, EmitterConfigError, SummaryEmitter},
    filter_result::FilterResult,
    limiter::RateLimiterRegistry,
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, Neutral, Permit, Storage},
    registry::{
        ConditionalRegistry, ConditionalRegistryBuilder, PresetBuilder, SharedConditional,
    },
};

#[cfg(feature = "async")]
pub use application::emitter::{EmitterHandle, ShutdownError};

pub use infrastructure::{
    clock::SystemClock,
    event::{Log, LogEvent},
    permit::PermitLimiter,
    slip::Slip,
    storage::ShardedStorage,
};
