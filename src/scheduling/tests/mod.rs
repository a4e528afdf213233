//! Unit tests for the scheduling module.
//!
//! Tests are organised by layer: domain value types, windowing rules,
//! conflict detection, profile resolution, and the end-to-end scheduler.

mod windowing_tests;

use crate::scheduling::domain::{CommunityId, ObservancePeriod, ObservanceType, Severity};
use chrono::{DateTime, Utc};

/// Parses an RFC 3339 timestamp into a UTC instant.
fn instant(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .expect("test timestamps are valid RFC 3339")
        .with_timezone(&Utc)
}

fn community(slug: &str) -> CommunityId {
    CommunityId::new(slug).expect("test community slugs are valid")
}

fn period(
    name: &str,
    slug: &str,
    observance_type: ObservanceType,
    window: (&str, &str),
    severity: Severity,
) -> ObservancePeriod {
    ObservancePeriod::new(
        name,
        community(slug),
        observance_type,
        instant(window.0),
        instant(window.1),
        severity,
    )
    .expect("test observance windows are valid")
}
