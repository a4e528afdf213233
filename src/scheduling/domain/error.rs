//! Error types for scheduling domain validation and parsing.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned while constructing scheduling domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulingDomainError {
    /// The community identifier is empty or contains unsupported characters.
    #[error("invalid community identifier '{0}', expected a lowercase slug")]
    InvalidCommunity(String),

    /// The observance type key is empty or contains unsupported characters.
    #[error("invalid observance type '{0}', expected a lowercase slug")]
    InvalidObservanceType(String),

    /// The language code is not a two or three letter code.
    #[error("invalid language code '{0}'")]
    InvalidLanguage(String),

    /// The observance name is empty after trimming.
    #[error("observance name must not be empty")]
    EmptyObservanceName,

    /// The observance window ends before it starts.
    #[error("observance window must end after it starts ({start} .. {end})")]
    InvalidObservanceWindow {
        /// Window start.
        start: DateTime<Utc>,
        /// Window end.
        end: DateTime<Utc>,
    },
}

/// Error returned while parsing severities from configuration or storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown severity: {0}")]
pub struct ParseSeverityError(pub String);

/// Error returned while parsing resolution strategies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown resolution strategy: {0}")]
pub struct ParseResolutionStrategyError(pub String);

/// Error returned while parsing observance levels.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown observance level: {0}")]
pub struct ParseObservanceLevelError(pub String);
