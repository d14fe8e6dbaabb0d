//! Refresh-window permit limiter.
//!
//! Time is divided into cycles of `limit_refresh_period`, starting when the
//! limiter is created. Each cycle grants `limit_for_period` permits. Unused
//! permits do not carry over.
//!
//! The (cycle, remaining) pair lives behind one atomic pointer and is
//! replaced with a compare-and-swap retry loop, so acquisition never takes
//! a lock and never waits.

use crate::application::ports::{Clock, Permit};
use crate::domain::quota::Quota;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    cycle: u64,
    remaining: u32,
}

/// Lock-free limiter granting a fixed number of permits per refresh period.
#[derive(Debug)]
pub struct PermitLimiter {
    name: String,
    quota: Quota,
    clock: Arc<dyn Clock>,
    anchor: Instant,
    window: ArcSwap<Window>,
}

impl PermitLimiter {
    /// Create a limiter with a full first cycle.
    pub fn new(name: impl Into<String>, quota: Quota, clock: Arc<dyn Clock>) -> Self {
        let anchor = clock.now();
        Self {
            name: name.into(),
            quota,
            clock,
            anchor,
            window: ArcSwap::from_pointee(Window {
                cycle: 0,
                remaining: quota.limit_for_period().get(),
            }),
        }
    }

    /// Name the limiter is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quota the limiter was created with.
    pub fn quota(&self) -> Quota {
        self.quota
    }

    /// Permits left in the current cycle.
    pub fn available_permissions(&self) -> u32 {
        let cycle = self.current_cycle();
        let window = self.window.load();
        if cycle > window.cycle {
            self.quota.limit_for_period().get()
        } else {
            window.remaining
        }
    }

    fn current_cycle(&self) -> u64 {
        let elapsed = self.clock.now().saturating_duration_since(self.anchor);
        let cycle = elapsed.as_nanos() / self.quota.limit_refresh_period().as_nanos();
        u64::try_from(cycle).unwrap_or(u64::MAX)
    }
}

impl Permit for PermitLimiter {
    fn acquire_permission(&self) -> bool {
        let cycle = self.current_cycle();
        let mut current = self.window.load();

        loop {
            let window: Window = **current;
            let remaining = if cycle > window.cycle {
                self.quota.limit_for_period().get()
            } else {
                window.remaining
            };

            if remaining == 0 {
                return false;
            }

            let next = Arc::new(Window {
                cycle: cycle.max(window.cycle),
                remaining: remaining - 1,
            });

            let previous = self.window.compare_and_swap(&*current, next);
            if Arc::ptr_eq(&*previous, &*current) {
                return true;
            }
            current = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::mocks::MockClock;
    use std::thread;
    use std::time::Duration;

    fn limiter(permits: u32, period: Duration, clock: Arc<dyn Clock>) -> PermitLimiter {
        PermitLimiter::new("test", Quota::new(permits, period).unwrap(), clock)
    }

    #[test]
    fn test_one_permit_per_five_seconds() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter(1, Duration::from_secs(5), clock.clone());

        let mut granted = 0;
        for _ in 0..10 {
            clock.advance(Duration::from_millis(100));
            if limiter.acquire_permission() {
                granted += 1;
            }
        }

        assert_eq!(granted, 1);
    }

    #[test]
    fn test_permits_restored_each_period() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter(2, Duration::from_secs(1), clock.clone());

        assert!(limiter.acquire_permission());
        assert!(limiter.acquire_permission());
        assert!(!limiter.acquire_permission());
        assert_eq!(limiter.available_permissions(), 0);

        clock.advance(Duration::from_secs(1));
        assert_eq!(limiter.available_permissions(), 2);
        assert!(limiter.acquire_permission());
        assert!(limiter.acquire_permission());
        assert!(!limiter.acquire_permission());
    }

    #[test]
    fn test_unused_permits_do_not_accumulate() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter(1, Duration::from_secs(1), clock.clone());

        // Idle for several periods
        clock.advance(Duration::from_secs(10));

        assert!(limiter.acquire_permission());
        assert!(!limiter.acquire_permission());
    }

    #[test]
    fn test_partial_period_does_not_refresh() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = limiter(1, Duration::from_secs(1), clock.clone());

        assert!(limiter.acquire_permission());
        clock.advance(Duration::from_millis(999));
        assert!(!limiter.acquire_permission());
        clock.advance(Duration::from_millis(1));
        assert!(limiter.acquire_permission());
    }

    #[test]
    fn test_concurrent_acquisition_is_exact() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let limiter = Arc::new(limiter(50, Duration::from_secs(3600), clock));
        let mut handles = vec![];

        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(thread::spawn(move || {
                (0..100).filter(|_| limiter.acquire_permission()).count()
            }));
        }

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 50);
    }

    #[test]
    fn test_accessors() {
        let limiter = limiter(7, Duration::from_secs(2), Arc::new(SystemClock::new()));
        assert_eq!(limiter.name(), "test");
        assert_eq!(limiter.quota().limit_for_period().get(), 7);
        assert_eq!(limiter.available_permissions(), 7);
    }
}
