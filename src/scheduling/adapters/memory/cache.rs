//! Read-through cache in front of another calendar.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::scheduling::{
    domain::{CommunityId, ObservancePeriod},
    ports::{CalendarError, CalendarResult, ObservanceCalendar},
};

type CacheKey = (Vec<CommunityId>, DateTime<Utc>, DateTime<Utc>);

/// Calendar decorator that memoises query results.
///
/// Keys are the sorted community set plus the query window, so repeated
/// scheduling of the same request hits the inner calendar once.
#[derive(Debug)]
pub struct CachingObservanceCalendar<C> {
    inner: Arc<C>,
    entries: RwLock<HashMap<CacheKey, Vec<ObservancePeriod>>>,
    misses: AtomicU64,
}

impl<C> CachingObservanceCalendar<C>
where
    C: ObservanceCalendar,
{
    /// Wraps `inner` with an empty cache.
    #[must_use]
    pub fn new(inner: Arc<C>) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            misses: AtomicU64::new(0),
        }
    }

    /// Drops every cached entry.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Unavailable`] when the lock is poisoned.
    pub fn invalidate(&self) -> CalendarResult<()> {
        let mut entries = self.entries.write().map_err(|err| {
            CalendarError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        entries.clear();
        Ok(())
    }

    /// Returns how many queries were forwarded to the inner calendar.
    #[must_use]
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn cached(&self, key: &CacheKey) -> CalendarResult<Option<Vec<ObservancePeriod>>> {
        let entries = self.entries.read().map_err(|err| {
            CalendarError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(entries.get(key).cloned())
    }
}

#[async_trait]
impl<C> ObservanceCalendar for CachingObservanceCalendar<C>
where
    C: ObservanceCalendar,
{
    async fn query(
        &self,
        communities: &[CommunityId],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalendarResult<Vec<ObservancePeriod>> {
        let mut sorted = communities.to_vec();
        sorted.sort();
        sorted.dedup();
        let key = (sorted, from, to);

        if let Some(hit) = self.cached(&key)? {
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let periods = self.inner.query(&key.0, from, to).await?;
        let mut entries = self.entries.write().map_err(|err| {
            CalendarError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        entries.insert(key, periods.clone());
        Ok(periods)
    }
}
