//! Engine configuration loaded from TOML.
//!
//! Every section and field is optional; missing values take the documented
//! defaults.
//!
//! ```toml
//! [retry]
//! max_retries = 5
//! base_retry_delay_secs = 300
//! max_retry_delay_secs = 86400
//!
//! [lease]
//! lease_ttl_secs = 300
//! dispatch_timeout_secs = 30
//!
//! [scheduling]
//! flag_floor = "low"
//! auto_resolve_ceiling = "medium"
//!
//! [worker]
//! workers = 4
//! poll_interval_ms = 500
//! claim_batch = 16
//! ```

use crate::delivery::{
    domain::{DeliveryDomainError, LeaseConfig, RetryPolicy},
    ports::{MessageRepository, MessageTransport, RecipientStatusStore},
    services::{MessageLifecycleService, WorkerConfig},
};
use crate::scheduling::services::{ResolutionPolicy, SchedulingThresholds};
use camino::Utf8Path;
use cap_std::fs_utf8::Dir;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path relative to the config directory.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`EngineConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<DeliveryDomainError> for ConfigError {
    fn from(err: DeliveryDomainError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Retry ceiling and backoff.
    pub retry: RetryPolicy,
    /// Lease and dispatch timeouts.
    pub lease: LeaseConfig,
    /// Conflict severity thresholds.
    pub scheduling: SchedulingThresholds,
    /// Worker pool sizing.
    pub worker: WorkerConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input or
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` inside `dir` and parses it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// as for [`Self::from_toml_str`].
    pub fn load(dir: &Dir, path: &Utf8Path) -> Result<Self, ConfigError> {
        let source = dir.read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        debug!(%path, "loaded engine config");
        Self::from_toml_str(&source)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()?;
        if self.retry.base_retry_delay_secs == 0 {
            return Err(ConfigError::Invalid(
                "retry.base_retry_delay_secs must be positive".to_owned(),
            ));
        }
        if self.retry.max_retry_delay_secs < self.retry.base_retry_delay_secs {
            return Err(ConfigError::Invalid(
                "retry.max_retry_delay_secs must not be below the base delay".to_owned(),
            ));
        }
        if self.lease.lease_ttl_secs == 0 || self.lease.dispatch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "lease timeouts must be positive".to_owned(),
            ));
        }
        if self.lease.dispatch_timeout_secs >= self.lease.lease_ttl_secs {
            return Err(ConfigError::Invalid(
                "lease.dispatch_timeout_secs must be shorter than lease.lease_ttl_secs".to_owned(),
            ));
        }
        if self.scheduling.flag_floor > self.scheduling.auto_resolve_ceiling {
            return Err(ConfigError::Invalid(
                "scheduling.flag_floor must not exceed scheduling.auto_resolve_ceiling".to_owned(),
            ));
        }
        if self.worker.workers == 0 || self.worker.claim_batch == 0 {
            return Err(ConfigError::Invalid(
                "worker.workers and worker.claim_batch must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the resolution policy for the configured thresholds.
    #[must_use]
    pub const fn resolution_policy(&self) -> ResolutionPolicy {
        ResolutionPolicy::new(self.scheduling)
    }

    /// Applies the retry, lease and claim settings to a lifecycle service.
    #[must_use]
    pub fn configure_lifecycle<R, S, T, C>(
        &self,
        service: MessageLifecycleService<R, S, T, C>,
    ) -> MessageLifecycleService<R, S, T, C>
    where
        R: MessageRepository,
        S: RecipientStatusStore,
        T: MessageTransport,
        C: Clock + Send + Sync,
    {
        service
            .with_retry_policy(self.retry)
            .with_lease_config(self.lease)
            .with_claim_batch(self.worker.claim_batch)
    }

    /// Wraps a configured lifecycle service for sharing with workers.
    #[must_use]
    pub fn shared_lifecycle<R, S, T, C>(
        &self,
        service: MessageLifecycleService<R, S, T, C>,
    ) -> Arc<MessageLifecycleService<R, S, T, C>>
    where
        R: MessageRepository,
        S: RecipientStatusStore,
        T: MessageTransport,
        C: Clock + Send + Sync,
    {
        Arc::new(self.configure_lifecycle(service))
    }
}
