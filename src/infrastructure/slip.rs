//! Call-site entry point for filtered logging.
//!
//! ```rust
//! use tracing_resist::{ConditionalRegistry, Log, LogEvent, Slip};
//!
//! let registry: ConditionalRegistry<LogEvent> = ConditionalRegistry::new();
//!
//! Slip::of(Log::info().message("cache refreshed"))
//!     .id(&registry, "cache-refresh", |b| b.limit_rate(1))
//!     .unwrap()
//!     .log_with(|context, event| event.field("suppressed", context.suppressed()));
//! ```

use crate::application::conditional::{BuildError, Conditional};
use crate::application::context::Context;
use crate::application::filter_result::FilterResult;
use crate::application::ports::{Neutral, Storage};
use crate::application::registry::{ConditionalRegistry, PresetBuilder, SharedConditional};
use std::sync::Arc;

/// A candidate waiting to be routed through a conditional.
#[derive(Debug, Clone)]
pub struct Slip<X> {
    source: X,
}

impl<X: 'static> Slip<X> {
    pub fn of(source: X) -> Self {
        Self { source }
    }

    /// Pass the candidate through unfiltered, counting it in a fresh context.
    pub fn nop(self) -> FilterResult<Arc<Context>, X> {
        Conditional::identity().evaluate(self.source)
    }

    /// Route the candidate through the registry's conditional for `id`.
    ///
    /// `configurer` customizes the preset builder and only runs when `id`
    /// is seen for the first time.
    ///
    /// # Errors
    /// Returns the `BuildError` of the configured builder.
    pub fn id<S, F>(
        self,
        registry: &ConditionalRegistry<X, S>,
        id: &str,
        configurer: F,
    ) -> Result<FilterResult<Arc<Context>, X>, BuildError>
    where
        X: Neutral,
        S: Storage<String, SharedConditional<X>> + Clone,
        F: FnOnce(PresetBuilder<X>) -> PresetBuilder<X>,
    {
        registry.evaluate(id, self.source, configurer)
    }
}
