//! Calendar port supplying observance periods.

use crate::scheduling::domain::{CommunityId, ObservancePeriod};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;

/// Source of observance periods for diaspora communities.
#[async_trait]
pub trait ObservanceCalendar: Send + Sync {
    /// Returns periods observed by any of `communities` that intersect
    /// `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidWindow`] when `to` is before `from`,
    /// or [`CalendarError::Unavailable`] when the backing source fails.
    async fn query(
        &self,
        communities: &[CommunityId],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalendarResult<Vec<ObservancePeriod>>;
}

/// Errors returned by calendar implementations.
#[derive(Debug, Clone, Error)]
pub enum CalendarError {
    /// The query window is inverted.
    #[error("invalid calendar window {from} .. {to}")]
    InvalidWindow {
        /// Window start.
        from: DateTime<Utc>,
        /// Window end.
        to: DateTime<Utc>,
    },

    /// The backing calendar source failed.
    #[error("calendar unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl CalendarError {
    /// Wraps a source failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
