//! Registry of named rate limiters.
//!
//! Limiters are singletons by name: the first request for a name creates
//! the limiter with the quota given at that time, and every later request
//! for the same name gets that limiter back regardless of its quota.

use crate::application::ports::{Clock, Storage};
use crate::domain::quota::{Quota, QuotaError};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::permit::PermitLimiter;
use crate::infrastructure::storage::ShardedStorage;
use std::sync::Arc;
use std::time::Duration;

/// Shared registry of `PermitLimiter`s keyed by name.
///
/// Cloning is cheap and clones share the same limiters.
#[derive(Debug, Clone)]
pub struct RateLimiterRegistry {
    storage: Arc<ShardedStorage<String, Arc<PermitLimiter>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiterRegistry {
    /// Create an empty registry reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Create an empty registry reading a custom clock (mainly for testing).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            storage: Arc::new(ShardedStorage::new()),
            clock,
        }
    }

    /// Get the limiter registered under `name`, creating it with `quota`
    /// if this is the first request for that name.
    ///
    /// # Errors
    /// Returns `QuotaError` if the limiter has to be created and the quota
    /// is invalid. An existing limiter is returned without validating.
    pub fn rate_limiter<F>(&self, name: &str, quota: F) -> Result<Arc<PermitLimiter>, QuotaError>
    where
        F: FnOnce() -> Result<Quota, QuotaError>,
    {
        if let Some(existing) = self.storage.get(name) {
            return Ok(existing);
        }

        let quota = quota()?;
        let clock = Arc::clone(&self.clock);
        Ok(self.storage.with_entry_mut(
            name.to_string(),
            || {
                tracing::debug!(
                    limiter = name,
                    limit_for_period = quota.limit_for_period().get(),
                    refresh_period_ms = quota.limit_refresh_period().as_millis() as u64,
                    "creating rate limiter"
                );
                Arc::new(PermitLimiter::new(name, quota, clock))
            },
            |limiter| Arc::clone(limiter),
        ))
    }

    /// Shorthand for `rate_limiter` with a `(permits, period)` pair.
    ///
    /// # Errors
    /// Same as `rate_limiter`.
    pub fn limiter_for(
        &self,
        name: &str,
        limit_for_period: u32,
        limit_refresh_period: Duration,
    ) -> Result<Arc<PermitLimiter>, QuotaError> {
        self.rate_limiter(name, || Quota::new(limit_for_period, limit_refresh_period))
    }

    /// Check if a limiter is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.storage.contains_key(name)
    }

    /// Get the number of registered limiters.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl Default for RateLimiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Permit;
    use crate::infrastructure::mocks::MockClock;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_registry_creation() {
        let registry = RateLimiterRegistry::new();
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_same_name_same_limiter() {
        let registry = RateLimiterRegistry::new();

        let first = registry.limiter_for("db", 1, Duration::from_secs(1)).unwrap();
        let second = registry.limiter_for("db", 100, Duration::from_secs(60)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        // First quota wins
        assert_eq!(second.quota().limit_for_period().get(), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("db"));
    }

    #[test]
    fn test_different_names_independent() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let registry = RateLimiterRegistry::with_clock(clock);

        let a = registry.limiter_for("a", 1, Duration::from_secs(1)).unwrap();
        let b = registry.limiter_for("b", 1, Duration::from_secs(1)).unwrap();

        assert!(a.acquire_permission());
        assert!(!a.acquire_permission());
        assert!(b.acquire_permission());
    }

    #[test]
    fn test_invalid_quota_not_registered() {
        let registry = RateLimiterRegistry::new();

        let result = registry.limiter_for("bad", 0, Duration::from_secs(1));
        assert_eq!(result.unwrap_err(), QuotaError::ZeroLimitForPeriod);
        assert!(!registry.contains("bad"));
    }

    #[test]
    fn test_existing_limiter_skips_quota() {
        let registry = RateLimiterRegistry::new();
        registry.limiter_for("ok", 2, Duration::from_secs(1)).unwrap();

        // Quota closure is not consulted once the name exists
        let limiter = registry
            .rate_limiter("ok", || Err(QuotaError::ZeroRefreshPeriod))
            .unwrap();
        assert_eq!(limiter.name(), "ok");
    }

    #[test]
    fn test_concurrent_creation_yields_one_limiter() {
        let registry = RateLimiterRegistry::new();
        let mut handles = vec![];

        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                registry.limiter_for("shared", 5, Duration::from_secs(1)).unwrap()
            }));
        }

        let limiters: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(limiters.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }
}
