//! Dispatch priority.

use super::DeliveryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch priority from 1 (lowest) to 10 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    /// Lowest priority.
    pub const MIN: Self = Self(1);
    /// Highest priority.
    pub const MAX: Self = Self(10);
    /// Priority assigned when none is requested.
    pub const DEFAULT: Self = Self(5);

    /// Creates a validated priority.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::InvalidPriority`] outside `1..=10`.
    pub const fn new(value: u8) -> Result<Self, DeliveryDomainError> {
        if value < Self::MIN.0 || value > Self::MAX.0 {
            return Err(DeliveryDomainError::InvalidPriority(value));
        }
        Ok(Self(value))
    }

    /// Creates a priority, clamping out-of-range values into `1..=10`.
    #[must_use]
    pub fn clamped(value: u8) -> Self {
        Self(value.clamp(Self::MIN.0, Self::MAX.0))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Priority {
    type Error = DeliveryDomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
