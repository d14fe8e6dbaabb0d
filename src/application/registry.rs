//! Per-identifier registry of conditionals.
//!
//! Each identifier maps to one shared conditional, created on first use from
//! a preset builder the caller can customize. Lookups on the hot path are a
//! single map read. Creation builds the candidate outside any map lock and
//! publishes it with insert-if-absent, so under a race every caller ends up
//! with the same conditional and the extra candidates are dropped.

use crate::application::conditional::{BuildError, Conditional, ConditionalBuilder};
use crate::application::context::Context;
use crate::application::filter_result::FilterResult;
use crate::application::limiter::RateLimiterRegistry;
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Neutral, Storage};
use crate::domain::summary::SuppressionSummary;
use crate::infrastructure::storage::ShardedStorage;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Conditional shape stored in a registry: counting context, identity
/// transformation.
pub type SharedConditional<X> = Arc<Conditional<Arc<Context>, X, X>>;

/// Builder customized by `get_or_create` configurers.
pub type PresetBuilder<X> = ConditionalBuilder<Arc<Context>, X, X>;

/// Registry mapping identifiers to conditionals over `X`.
///
/// Generic over the storage implementation. In production, use the default
/// `Arc<ShardedStorage>`.
pub struct ConditionalRegistry<X, S = Arc<ShardedStorage<String, SharedConditional<X>>>>
where
    X: Neutral + 'static,
    S: Storage<String, SharedConditional<X>> + Clone,
{
    storage: S,
    rate_limiters: RateLimiterRegistry,
    metrics: Metrics,
    _candidate: PhantomData<fn(X) -> X>,
}

impl<X> ConditionalRegistry<X>
where
    X: Neutral + 'static,
{
    /// Create a registry with its own rate limiters on the system clock.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring the registry.
    pub fn builder() -> ConditionalRegistryBuilder<X> {
        ConditionalRegistryBuilder {
            clock: None,
            rate_limiters: None,
            _candidate: PhantomData,
        }
    }
}

impl<X> Default for ConditionalRegistry<X>
where
    X: Neutral + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<X, S> ConditionalRegistry<X, S>
where
    X: Neutral + 'static,
    S: Storage<String, SharedConditional<X>> + Clone,
{
    /// Create a registry over custom storage.
    pub fn with_storage(storage: S, rate_limiters: RateLimiterRegistry) -> Self {
        Self {
            storage,
            rate_limiters,
            metrics: Metrics::new(),
            _candidate: PhantomData,
        }
    }

    /// Get the conditional for `id`, creating it on first use.
    ///
    /// On a miss, `configurer` receives the preset builder: fresh context,
    /// accept/reject callbacks that count into the context and the registry
    /// metrics, `X::neutral` as the neutral source, identity transformation,
    /// and this registry's rate limiters. The configurer runs without any
    /// map lock held and may run more than once when callers race on a new
    /// id; only the first inserted conditional is kept.
    ///
    /// # Errors
    /// Returns the `BuildError` of the configured builder. Nothing is
    /// inserted in that case.
    pub fn get_or_create<F>(&self, id: &str, configurer: F) -> Result<SharedConditional<X>, BuildError>
    where
        F: FnOnce(PresetBuilder<X>) -> PresetBuilder<X>,
    {
        if let Some(existing) = self.storage.get(id) {
            return Ok(existing);
        }

        let candidate = Arc::new(configurer(preset(id, &self.metrics, &self.rate_limiters)).build()?);
        let (conditional, inserted) = self.storage.insert_if_absent(id.to_string(), candidate);

        if inserted {
            self.metrics.record_conditional_created();
            tracing::debug!(id, "created conditional");
        } else {
            tracing::debug!(id, "conditional created concurrently, discarding candidate");
        }

        Ok(conditional)
    }

    /// Look up (or create) the conditional for `id` and evaluate `source`.
    ///
    /// # Errors
    /// Same as `get_or_create`.
    pub fn evaluate<F>(
        &self,
        id: &str,
        source: X,
        configurer: F,
    ) -> Result<FilterResult<Arc<Context>, X>, BuildError>
    where
        F: FnOnce(PresetBuilder<X>) -> PresetBuilder<X>,
    {
        let conditional = self.get_or_create(id, configurer)?;
        Ok(conditional.evaluate(source))
    }

    /// Get the conditional for `id` if it exists.
    pub fn get(&self, id: &str) -> Option<SharedConditional<X>> {
        self.storage.get(id)
    }

    /// Get the number of registered identifiers.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drop every conditional. Shared rate limiters are kept.
    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Registry-wide counters.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Limiters that `limit_rate` and `limit_named` resolve against.
    pub fn rate_limiters(&self) -> &RateLimiterRegistry {
        &self.rate_limiters
    }

    /// Identifiers with at least `min_pending` rejects since their last
    /// accept, sorted by identifier.
    pub fn summaries(&self, min_pending: u64) -> Vec<SuppressionSummary> {
        let mut summaries = Vec::new();
        self.storage.for_each(|id, conditional| {
            let state = conditional.context().state();
            if state.next_suppressed_count() >= min_pending {
                summaries.push(SuppressionSummary::new(id.as_str(), state));
            }
        });
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}

fn preset<X>(id: &str, metrics: &Metrics, rate_limiters: &RateLimiterRegistry) -> PresetBuilder<X>
where
    X: Neutral + 'static,
{
    let on_accept_metrics = metrics.clone();
    let on_reject_metrics = metrics.clone();

    ConditionalBuilder::new()
        .id(id)
        .context(Context::shared())
        .transformation(|source| source)
        .neutral_source(X::neutral)
        .rate_limiters(rate_limiters.clone())
        .on_accept(move |context: &Arc<Context>| {
            context.on_accept();
            on_accept_metrics.record_accepted();
        })
        .on_reject(move |context: &Arc<Context>| {
            context.on_reject();
            on_reject_metrics.record_rejected();
        })
}

impl<X, S> Clone for ConditionalRegistry<X, S>
where
    X: Neutral + 'static,
    S: Storage<String, SharedConditional<X>> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            rate_limiters: self.rate_limiters.clone(),
            metrics: self.metrics.clone(),
            _candidate: PhantomData,
        }
    }
}

impl<X, S> fmt::Debug for ConditionalRegistry<X, S>
where
    X: Neutral + 'static,
    S: Storage<String, SharedConditional<X>> + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalRegistry")
            .field("conditionals", &self.storage.len())
            .field("rate_limiters", &self.rate_limiters.len())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

/// Builder for `ConditionalRegistry`.
///
/// Defaults:
/// - Rate limiters: a fresh registry
/// - Clock: system clock (only used when no rate limiters are supplied)
pub struct ConditionalRegistryBuilder<X> {
    clock: Option<Arc<dyn Clock>>,
    rate_limiters: Option<RateLimiterRegistry>,
    _candidate: PhantomData<fn(X) -> X>,
}

impl<X> ConditionalRegistryBuilder<X>
where
    X: Neutral + 'static,
{
    /// Set the clock a fresh rate limiter registry reads (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing rate limiter registry. Takes precedence over
    /// `with_clock`.
    pub fn with_rate_limiters(mut self, rate_limiters: RateLimiterRegistry) -> Self {
        self.rate_limiters = Some(rate_limiters);
        self
    }

    /// Build the registry.
    pub fn build(self) -> ConditionalRegistry<X> {
        let rate_limiters = match (self.rate_limiters, self.clock) {
            (Some(rate_limiters), _) => rate_limiters,
            (None, Some(clock)) => RateLimiterRegistry::with_clock(clock),
            (None, None) => RateLimiterRegistry::new(),
        };
        ConditionalRegistry::with_storage(Arc::new(ShardedStorage::new()), rate_limiters)
    }
}
