//! Rate limiter quotas.
//!
//! A quota grants `limit_for_period` permits per `limit_refresh_period`.
//! Acquisition never waits: a caller either gets a permit immediately or is
//! rejected.

use std::num::NonZeroU32;
use std::time::Duration;

/// Error returned when a quota is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaError {
    /// At least one permit per period is required
    ZeroLimitForPeriod,
    /// Refresh period must be greater than zero
    ZeroRefreshPeriod,
}

impl std::fmt::Display for QuotaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaError::ZeroLimitForPeriod => {
                write!(f, "limit for period must be greater than 0")
            }
            QuotaError::ZeroRefreshPeriod => {
                write!(f, "limit refresh period must be greater than 0")
            }
        }
    }
}

impl std::error::Error for QuotaError {}

/// Permits granted per refresh period.
///
/// # Example
/// ```
/// use tracing_resist::Quota;
/// use std::time::Duration;
///
/// let quota = Quota::new(5, Duration::from_secs(1)).unwrap();
/// assert_eq!(quota.limit_for_period().get(), 5);
///
/// assert!(Quota::new(0, Duration::from_secs(1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    limit_for_period: NonZeroU32,
    limit_refresh_period: Duration,
}

impl Quota {
    /// Create a quota.
    ///
    /// # Errors
    /// Returns `QuotaError` if either argument is zero.
    pub fn new(limit_for_period: u32, limit_refresh_period: Duration) -> Result<Self, QuotaError> {
        let limit_for_period =
            NonZeroU32::new(limit_for_period).ok_or(QuotaError::ZeroLimitForPeriod)?;
        if limit_refresh_period.is_zero() {
            return Err(QuotaError::ZeroRefreshPeriod);
        }
        Ok(Self {
            limit_for_period,
            limit_refresh_period,
        })
    }

    /// `permits` per second.
    ///
    /// # Errors
    /// Returns `QuotaError::ZeroLimitForPeriod` if `permits` is zero.
    pub fn per_second(permits: u32) -> Result<Self, QuotaError> {
        Self::new(permits, Duration::from_secs(1))
    }

    /// Permits granted per refresh period.
    pub fn limit_for_period(&self) -> NonZeroU32 {
        self.limit_for_period
    }

    /// Length of one refresh period.
    pub fn limit_refresh_period(&self) -> Duration {
        self.limit_refresh_period
    }

    /// Time a caller waits for a permit. Always zero.
    pub fn timeout(&self) -> Duration {
        Duration::ZERO
    }
}
