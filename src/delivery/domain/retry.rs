//! Retry ceiling and exponential backoff.

use super::DeliveryDomainError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound accepted for any message's retry ceiling.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Retry configuration for message delivery.
///
/// The delay before retry `n` (1-based) is `base * 2^(n - 1)` seconds,
/// capped at `max_retry_delay_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retry ceiling applied to messages that do not set their own.
    ///
    /// Default: 5
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff, in seconds.
    ///
    /// Default: 300 seconds (5 minutes)
    #[serde(default = "defaults::base_retry_delay_secs")]
    pub base_retry_delay_secs: u64,

    /// Cap on the backoff delay, in seconds.
    ///
    /// Default: 86400 seconds (24 hours)
    #[serde(default = "defaults::max_retry_delay_secs")]
    pub max_retry_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            base_retry_delay_secs: defaults::base_retry_delay_secs(),
            max_retry_delay_secs: defaults::max_retry_delay_secs(),
        }
    }
}

impl RetryPolicy {
    /// Checks the retry ceiling is within `1..=10`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::InvalidMaxRetries`] otherwise.
    pub const fn validate(&self) -> Result<(), DeliveryDomainError> {
        validate_max_retries(self.max_retries)
    }

    /// Returns the backoff delay after `retry_count` failures.
    ///
    /// A count of zero yields no delay.
    #[must_use]
    pub fn backoff_delay(&self, retry_count: u32) -> TimeDelta {
        let Some(exponent) = retry_count.checked_sub(1) else {
            return TimeDelta::zero();
        };
        let factor = 2_u64.checked_pow(exponent).unwrap_or(u64::MAX);
        let secs = self
            .base_retry_delay_secs
            .saturating_mul(factor)
            .min(self.max_retry_delay_secs);
        i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Returns when the next attempt may start after `retry_count` failures.
    #[must_use]
    pub fn next_retry_at(&self, now: DateTime<Utc>, retry_count: u32) -> DateTime<Utc> {
        now.checked_add_signed(self.backoff_delay(retry_count))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Checks a retry ceiling is within `1..=10`.
///
/// # Errors
///
/// Returns [`DeliveryDomainError::InvalidMaxRetries`] otherwise.
pub const fn validate_max_retries(max_retries: u32) -> Result<(), DeliveryDomainError> {
    if max_retries == 0 || max_retries > MAX_RETRIES_LIMIT {
        return Err(DeliveryDomainError::InvalidMaxRetries(max_retries));
    }
    Ok(())
}

mod defaults {
    pub const fn max_retries() -> u32 {
        5
    }

    pub const fn base_retry_delay_secs() -> u64 {
        300
    }

    pub const fn max_retry_delay_secs() -> u64 {
        86_400
    }
}
