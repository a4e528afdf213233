//! Lookup from observance type to windowing rule.

use super::{
    EveningDevotionRule, FestivalEveningRule, FullDayRule, GenericRule, MorningContemplationRule,
    WindowingRule,
};
use crate::scheduling::domain::ObservanceType;
use std::collections::HashMap;
use std::sync::Arc;

/// Windowing rules keyed by observance type, with a generic fallback.
#[derive(Debug, Clone)]
pub struct WindowingRegistry {
    rules: HashMap<ObservanceType, Arc<dyn WindowingRule>>,
    fallback: Arc<dyn WindowingRule>,
}

impl WindowingRegistry {
    /// Creates a registry with no type-specific rules.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
            fallback: Arc::new(GenericRule),
        }
    }

    /// Creates a registry with rules for the well-known observance types.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::empty()
            .with_rule(
                ObservanceType::MONTHLY_RECURRING,
                MorningContemplationRule::new(),
            )
            .with_rule(ObservanceType::ANNUAL, FullDayRule)
            .with_rule(ObservanceType::VARIABLE_DATE, EveningDevotionRule::new())
            .with_rule(ObservanceType::FESTIVAL, FestivalEveningRule::new())
    }

    /// Registers `rule` for `observance_type`, returning the rule it
    /// replaced.
    pub fn register(
        &mut self,
        observance_type: ObservanceType,
        rule: impl WindowingRule + 'static,
    ) -> Option<Arc<dyn WindowingRule>> {
        self.rules.insert(observance_type, Arc::new(rule))
    }

    /// Registers `rule` for `observance_type` and returns the registry.
    #[must_use]
    pub fn with_rule(
        mut self,
        observance_type: ObservanceType,
        rule: impl WindowingRule + 'static,
    ) -> Self {
        self.rules.insert(observance_type, Arc::new(rule));
        self
    }

    /// Returns the rule registered for `observance_type`, or the fallback.
    #[must_use]
    pub fn rule_for(&self, observance_type: &ObservanceType) -> &dyn WindowingRule {
        self.rules
            .get(observance_type)
            .map_or(self.fallback.as_ref(), |rule| rule.as_ref())
    }

    /// Returns whether a type-specific rule is registered.
    #[must_use]
    pub fn has_rule(&self, observance_type: &ObservanceType) -> bool {
        self.rules.contains_key(observance_type)
    }

    /// Returns the generic fallback rule.
    #[must_use]
    pub fn fallback(&self) -> &dyn WindowingRule {
        self.fallback.as_ref()
    }
}

impl Default for WindowingRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
