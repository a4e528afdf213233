//! Time-bounded delivery leases.

use super::{LeaseToken, WorkerId};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Exclusive, expiring right to attempt delivery of one message.
///
/// A lease that has expired may be taken over by another worker; the
/// original holder's token then no longer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// Ownership token.
    pub token: LeaseToken,
    /// Holding worker.
    pub worker: WorkerId,
    /// Grant time.
    pub acquired_at: DateTime<Utc>,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
}

impl Lease {
    /// Grants a fresh lease to `worker` for `ttl` from `now`.
    #[must_use]
    pub fn grant(worker: WorkerId, now: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            token: LeaseToken::new(),
            worker,
            acquired_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Returns whether the lease has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns how long the lease still has to run at `now`, or zero once
    /// it has lapsed.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> std::time::Duration {
        self.expires_at
            .signed_duration_since(now)
            .to_std()
            .unwrap_or_default()
    }
}

/// Lease and dispatch timing for delivery workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseConfig {
    /// Lease lifetime, in seconds.
    ///
    /// Default: 300 seconds
    #[serde(default = "defaults::lease_ttl_secs")]
    pub lease_ttl_secs: u64,

    /// Deadline for a single dispatch call, in seconds.
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            lease_ttl_secs: defaults::lease_ttl_secs(),
            dispatch_timeout_secs: defaults::dispatch_timeout_secs(),
        }
    }
}

impl LeaseConfig {
    /// Returns the lease lifetime.
    #[must_use]
    pub fn lease_ttl(&self) -> TimeDelta {
        i64::try_from(self.lease_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Returns the dispatch deadline.
    #[must_use]
    pub const fn dispatch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.dispatch_timeout_secs)
    }
}

mod defaults {
    pub const fn lease_ttl_secs() -> u64 {
        300
    }

    pub const fn dispatch_timeout_secs() -> u64 {
        30
    }
}
