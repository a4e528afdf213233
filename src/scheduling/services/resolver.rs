//! Resolution of recipient profiles to observance scope and local time.

use crate::scheduling::domain::{
    CommunityId, DiasporaProfile, Location, ObservanceLevel, ScopeDescriptor, Severity, ZoneSpec,
};
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashMap;
use tracing::warn;

/// Zones for the diaspora clusters the engine knows without an explicit
/// zone on the profile.
const KNOWN_CLUSTERS: [(&str, &str); 8] = [
    ("bay area", "America/Los_Angeles"),
    ("san francisco", "America/Los_Angeles"),
    ("toronto", "America/Toronto"),
    ("new york", "America/New_York"),
    ("london", "Europe/London"),
    ("sydney", "Australia/Sydney"),
    ("melbourne", "Australia/Melbourne"),
    ("colombo", "Asia/Colombo"),
];

/// Calendars, zone, and flag floor that apply to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservanceScope {
    /// Communities whose observances apply, sorted and deduplicated.
    pub communities: Vec<CommunityId>,
    /// Zone used to interpret wall-clock windows.
    pub zone: ZoneSpec,
    /// Recipient location, used to filter regional observances.
    pub location: Location,
    /// Lowest severity treated as a conflict for this recipient.
    pub flag_floor: Severity,
}

/// Maps diaspora profiles to the observance rules that apply to them.
#[derive(Debug, Clone)]
pub struct DiasporaRelevanceResolver {
    clusters: HashMap<String, String>,
}

impl DiasporaRelevanceResolver {
    /// Creates a resolver aware of the built-in diaspora clusters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clusters(
            KNOWN_CLUSTERS
                .iter()
                .map(|(place, zone)| ((*place).to_owned(), (*zone).to_owned())),
        )
    }

    /// Creates a resolver with a custom place-to-zone map.
    ///
    /// Place names are matched against a profile's region then city,
    /// ignoring ASCII case.
    #[must_use]
    pub fn with_clusters(clusters: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            clusters: clusters
                .into_iter()
                .map(|(place, zone)| (place.trim().to_ascii_lowercase(), zone))
                .collect(),
        }
    }

    /// Resolves an IANA identifier, falling back to UTC.
    ///
    /// An unresolvable identifier is logged and treated as UTC so that
    /// scheduling can proceed.
    #[must_use]
    pub fn resolve_zone(&self, identifier: &str) -> ZoneSpec {
        ZoneSpec::parse(identifier).unwrap_or_else(|| {
            warn!(zone = identifier, "unresolvable time zone, falling back to UTC");
            ZoneSpec::Utc
        })
    }

    /// Determines which communities, zone, and flag floor apply to
    /// `profile`.
    ///
    /// The zone comes from the profile's explicit identifier, else from the
    /// known cluster for its region or city, else UTC.
    #[must_use]
    pub fn resolve_observance_scope(
        &self,
        profile: &DiasporaProfile,
        default_floor: Severity,
    ) -> ObservanceScope {
        let mut communities = profile.communities.clone();
        communities.sort();
        communities.dedup();

        ObservanceScope {
            communities,
            zone: self.zone_for(profile),
            location: profile.location.clone(),
            flag_floor: flag_floor_for(profile.observance_level, default_floor),
        }
    }

    /// Expresses `instant` in the zone named by `zone_identifier`.
    #[must_use]
    pub fn convert_to_local(
        &self,
        instant: DateTime<Utc>,
        zone_identifier: &str,
    ) -> DateTime<FixedOffset> {
        self.resolve_zone(zone_identifier).to_local(instant)
    }

    /// Inverse of [`Self::convert_to_local`].
    #[must_use]
    pub fn convert_to_utc(&self, local: DateTime<FixedOffset>) -> DateTime<Utc> {
        local.with_timezone(&Utc)
    }

    /// Returns whether a scope applies to `target`.
    ///
    /// Global scopes apply everywhere. Otherwise any of city, state,
    /// country, or region set on the scope must equal the target's value,
    /// ignoring ASCII case.
    #[must_use]
    pub fn is_relevant_for_location(&self, scope: &ScopeDescriptor, target: &Location) -> bool {
        if scope.global {
            return true;
        }
        let wanted = &scope.location;
        [
            (&wanted.city, &target.city),
            (&wanted.state, &target.state),
            (&wanted.country, &target.country),
            (&wanted.region, &target.region),
        ]
        .into_iter()
        .any(|(expected, actual)| matches_field(expected.as_deref(), actual.as_deref()))
    }

    fn zone_for(&self, profile: &DiasporaProfile) -> ZoneSpec {
        if let Some(identifier) = &profile.time_zone {
            return self.resolve_zone(identifier);
        }
        let location = &profile.location;
        let cluster = [&location.region, &location.city]
            .into_iter()
            .flatten()
            .find_map(|place| self.clusters.get(&place.trim().to_ascii_lowercase()));
        cluster.map_or(ZoneSpec::Utc, |identifier| self.resolve_zone(identifier))
    }
}

impl Default for DiasporaRelevanceResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_field(expected: Option<&str>, actual: Option<&str>) -> bool {
    match (expected, actual) {
        (Some(wanted), Some(found)) => wanted.trim().eq_ignore_ascii_case(found.trim()),
        _ => false,
    }
}

fn flag_floor_for(level: ObservanceLevel, default_floor: Severity) -> Severity {
    match level {
        ObservanceLevel::Devout => default_floor.min(Severity::Low),
        ObservanceLevel::Moderate => default_floor,
        ObservanceLevel::Relaxed => default_floor.max(Severity::Medium),
    }
}
