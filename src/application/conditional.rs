//! Conditional transform engine.
//!
//! A `Conditional` turns a candidate value into either its transformation
//! (accepted) or a neutral substitute (rejected). The decision comes from a
//! chain of clauses AND-ed in the order they were configured: user
//! predicates and rate limiter permits. Evaluation stops at the first clause
//! that fails, so a limiter later in the chain is not charged for a
//! candidate an earlier predicate already rejected.

use crate::application::context::Context;
use crate::application::filter_result::FilterResult;
use crate::application::limiter::RateLimiterRegistry;
use crate::application::ports::Permit;
use crate::domain::quota::{Quota, QuotaError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Predicate<X> = Box<dyn Fn(&X) -> bool + Send + Sync>;
type Transformation<X, R> = Box<dyn Fn(X) -> R + Send + Sync>;
type Callback<C> = Box<dyn Fn(&C) + Send + Sync>;
type NeutralSource<R> = Box<dyn Fn() -> R + Send + Sync>;

/// Error returned when a `ConditionalBuilder` cannot produce a conditional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No transformation was configured
    MissingTransformation,
    /// A predicate was configured without a neutral source to fall back on
    MissingNeutralSource,
    /// `limit_rate` needs an id to name its limiter
    MissingId,
    /// A rate limit was configured without a limiter registry
    MissingRateLimiters,
    /// A rate limit quota was invalid
    Quota(QuotaError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MissingTransformation => write!(f, "transformation is required"),
            BuildError::MissingNeutralSource => {
                write!(f, "neutral source is required when a predicate is configured")
            }
            BuildError::MissingId => write!(f, "limit_rate requires an id"),
            BuildError::MissingRateLimiters => {
                write!(f, "rate limits require a rate limiter registry")
            }
            BuildError::Quota(e) => write!(f, "invalid quota: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Quota(e) => Some(e),
            _ => None,
        }
    }
}

impl From<QuotaError> for BuildError {
    fn from(e: QuotaError) -> Self {
        BuildError::Quota(e)
    }
}

enum Clause<X> {
    Source(Predicate<X>),
    Permit(Arc<dyn Permit>),
}

impl<X> Clause<X> {
    fn test(&self, source: &X) -> bool {
        match self {
            Clause::Source(predicate) => predicate(source),
            Clause::Permit(limiter) => limiter.acquire_permission(),
        }
    }
}

struct Gate<X, R> {
    clauses: Vec<Clause<X>>,
    neutral_source: NeutralSource<R>,
}

impl<X, R> Gate<X, R> {
    fn admits(&self, source: &X) -> bool {
        self.clauses.iter().all(|clause| clause.test(source))
    }
}

/// A reusable, immutable filter/transform unit.
///
/// `C` is the context handed to callbacks and returned with each result,
/// `X` the candidate type and `R` the produced type. Use `C = ()` when no
/// statistics are wanted.
pub struct Conditional<C, X, R> {
    id: Option<String>,
    context: C,
    gate: Option<Gate<X, R>>,
    transformation: Transformation<X, R>,
    on_accept: Option<Callback<C>>,
    on_reject: Option<Callback<C>>,
}

impl<C, X, R> Conditional<C, X, R> {
    /// Start configuring a conditional.
    pub fn builder() -> ConditionalBuilder<C, X, R>
    where
        C: 'static,
        X: 'static,
        R: 'static,
    {
        ConditionalBuilder::new()
    }

    /// Identifier, if one was configured.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The context every evaluation reports against.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Evaluate one candidate.
    ///
    /// On pass the accept callback runs, then the transformation. On
    /// failure the reject callback runs, then the neutral source. Panics
    /// raised by any of them propagate to the caller.
    pub fn evaluate(&self, source: X) -> FilterResult<C, R>
    where
        C: Clone,
    {
        let rejecting_gate = self.gate.as_ref().filter(|gate| !gate.admits(&source));

        let result = match rejecting_gate {
            None => {
                if let Some(on_accept) = &self.on_accept {
                    on_accept(&self.context);
                }
                (self.transformation)(source)
            }
            Some(gate) => {
                if let Some(on_reject) = &self.on_reject {
                    on_reject(&self.context);
                }
                (gate.neutral_source)()
            }
        };

        FilterResult::new(self.context.clone(), result)
    }
}

impl<X: 'static> Conditional<Arc<Context>, X, X> {
    /// Always-accepting conditional that returns its input unchanged and
    /// records each evaluation in a fresh context.
    pub fn identity() -> Self {
        Self {
            id: None,
            context: Context::shared(),
            gate: None,
            transformation: Box::new(|source: X| source),
            on_accept: Some(Box::new(|context: &Arc<Context>| {
                context.on_accept();
            })),
            on_reject: Some(Box::new(|context: &Arc<Context>| {
                context.on_reject();
            })),
        }
    }
}

impl<C: fmt::Debug, X, R> fmt::Debug for Conditional<C, X, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditional")
            .field("id", &self.id)
            .field("context", &self.context)
            .field(
                "clauses",
                &self.gate.as_ref().map_or(0, |gate| gate.clauses.len()),
            )
            .finish_non_exhaustive()
    }
}

enum PendingClause<X> {
    Source(Predicate<X>),
    OwnRate(u32),
    NamedRate {
        name: String,
        limit_for_period: u32,
        limit_refresh_period: Duration,
    },
}

/// Fluent builder for `Conditional`.
///
/// Defaults:
/// - Context: `C::default()`
/// - Predicate: none (always accept)
/// - Callbacks: none (context left untouched)
/// - `limit_rate` refresh period: 1 second
pub struct ConditionalBuilder<C, X, R> {
    id: Option<String>,
    context: Option<C>,
    transformation: Option<Transformation<X, R>>,
    on_accept: Option<Callback<C>>,
    on_reject: Option<Callback<C>>,
    neutral_source: Option<NeutralSource<R>>,
    rate_limiters: Option<RateLimiterRegistry>,
    clauses: Vec<PendingClause<X>>,
}

impl<C: 'static, X: 'static, R: 'static> ConditionalBuilder<C, X, R> {
    pub fn new() -> Self {
        Self {
            id: None,
            context: None,
            transformation: None,
            on_accept: None,
            on_reject: None,
            neutral_source: None,
            rate_limiters: None,
            clauses: Vec::new(),
        }
    }

    /// Set the identifier. `limit_rate` names its limiter after it.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the context passed to callbacks and returned with results.
    pub fn context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the transformation applied to accepted candidates.
    pub fn transformation<F>(mut self, transformation: F) -> Self
    where
        F: Fn(X) -> R + Send + Sync + 'static,
    {
        self.transformation = Some(Box::new(transformation));
        self
    }

    /// Set the callback run on every accept.
    pub fn on_accept<F>(mut self, callback: F) -> Self
    where
        F: Fn(&C) + Send + Sync + 'static,
    {
        self.on_accept = Some(Box::new(callback));
        self
    }

    /// Set the callback run on every reject.
    pub fn on_reject<F>(mut self, callback: F) -> Self
    where
        F: Fn(&C) + Send + Sync + 'static,
    {
        self.on_reject = Some(Box::new(callback));
        self
    }

    /// Set the supplier of the value rejected candidates are replaced with.
    pub fn neutral_source<F>(mut self, neutral_source: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.neutral_source = Some(Box::new(neutral_source));
        self
    }

    /// Set the registry rate limits are resolved against.
    pub fn rate_limiters(mut self, rate_limiters: RateLimiterRegistry) -> Self {
        self.rate_limiters = Some(rate_limiters);
        self
    }

    /// AND a predicate over the candidate.
    pub fn limit<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&X) -> bool + Send + Sync + 'static,
    {
        self.clauses.push(PendingClause::Source(Box::new(predicate)));
        self
    }

    /// AND a predicate that ignores the candidate.
    pub fn limit_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.clauses
            .push(PendingClause::Source(Box::new(move |_: &X| predicate())));
        self
    }

    /// AND a limit of `permits_per_second` under this conditional's id.
    pub fn limit_rate(mut self, permits_per_second: u32) -> Self {
        self.clauses.push(PendingClause::OwnRate(permits_per_second));
        self
    }

    /// AND a limit shared by every conditional naming the same limiter.
    ///
    /// The first conditional to create `name` decides its quota.
    pub fn limit_named(
        mut self,
        name: impl Into<String>,
        limit_for_period: u32,
        limit_refresh_period: Duration,
    ) -> Self {
        self.clauses.push(PendingClause::NamedRate {
            name: name.into(),
            limit_for_period,
            limit_refresh_period,
        });
        self
    }

    /// Validate the configuration and resolve rate limiters.
    ///
    /// # Errors
    /// See `BuildError` for the configurations that are refused.
    pub fn build(self) -> Result<Conditional<C, X, R>, BuildError>
    where
        C: Default,
    {
        let transformation = self
            .transformation
            .ok_or(BuildError::MissingTransformation)?;

        let gate = if self.clauses.is_empty() {
            None
        } else {
            let neutral_source = self.neutral_source.ok_or(BuildError::MissingNeutralSource)?;
            let clauses = self
                .clauses
                .into_iter()
                .map(|clause| resolve(clause, self.id.as_deref(), self.rate_limiters.as_ref()))
                .collect::<Result<Vec<_>, _>>()?;
            Some(Gate {
                clauses,
                neutral_source,
            })
        };

        Ok(Conditional {
            id: self.id,
            context: self.context.unwrap_or_default(),
            gate,
            transformation,
            on_accept: self.on_accept,
            on_reject: self.on_reject,
        })
    }
}

impl<C: 'static, X: 'static, R: 'static> Default for ConditionalBuilder<C, X, R> {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve<X>(
    clause: PendingClause<X>,
    id: Option<&str>,
    rate_limiters: Option<&RateLimiterRegistry>,
) -> Result<Clause<X>, BuildError> {
    let (name, quota) = match clause {
        PendingClause::Source(predicate) => return Ok(Clause::Source(predicate)),
        PendingClause::OwnRate(permits) => {
            let id = id.ok_or(BuildError::MissingId)?;
            (id.to_string(), Quota::per_second(permits))
        }
        PendingClause::NamedRate {
            name,
            limit_for_period,
            limit_refresh_period,
        } => (name, Quota::new(limit_for_period, limit_refresh_period)),
    };

    let rate_limiters = rate_limiters.ok_or(BuildError::MissingRateLimiters)?;
    let limiter = rate_limiters.rate_limiter(&name, || quota)?;
    Ok(Clause::Permit(limiter))
}
