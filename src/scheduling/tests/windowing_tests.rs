//! Tests for the per-observance windowing rules and their registry.

use super::{instant, period};
use crate::scheduling::{
    domain::{ObservancePeriod, ObservanceType, Severity, ZoneSpec},
    windowing::{
        EveningDevotionRule, FestivalEveningRule, FullDayRule, GenericRule,
        MorningContemplationRule, WindowingContext, WindowingRegistry, WindowingRule,
    },
};
use chrono::{NaiveTime, TimeDelta};
use rstest::{fixture, rstest};

#[fixture]
fn poya() -> ObservancePeriod {
    period(
        "Vesak Poya",
        "sinhala-buddhist",
        ObservanceType::VARIABLE_DATE,
        ("2025-05-12T12:30:00Z", "2025-05-12T16:30:00Z"),
        Severity::High,
    )
}

fn context<'a>(proposed: &str, period: &'a ObservancePeriod, zone: ZoneSpec) -> WindowingContext<'a> {
    WindowingContext {
        proposed: instant(proposed),
        duration: TimeDelta::zero(),
        period,
        zone,
    }
}

#[rstest]
fn morning_rule_offers_afternoon_then_next_morning(poya: ObservancePeriod) {
    let ctx = context("2025-03-14T08:00:00Z", &poya, ZoneSpec::Utc);
    assert_eq!(
        MorningContemplationRule::new().alternatives(&ctx),
        vec![
            instant("2025-03-14T14:00:00Z"),
            instant("2025-03-14T16:00:00Z"),
            instant("2025-03-15T09:00:00Z"),
        ]
    );
}

#[rstest]
fn morning_rule_slots_are_configurable(poya: ObservancePeriod) {
    let rule = MorningContemplationRule::new()
        .with_afternoon_slots([NaiveTime::from_hms_opt(13, 30, 0).expect("valid time")]);
    let ctx = context("2025-03-14T08:00:00Z", &poya, ZoneSpec::Utc);
    assert_eq!(
        rule.alternatives(&ctx),
        vec![
            instant("2025-03-14T13:30:00Z"),
            instant("2025-03-15T09:00:00Z"),
        ]
    );
}

#[rstest]
fn evening_rule_uses_recipient_wall_clock(poya: ObservancePeriod) {
    let colombo = ZoneSpec::parse("Asia/Colombo").expect("known zone");
    let ctx = context("2025-05-12T13:30:00Z", &poya, colombo);
    assert_eq!(
        EveningDevotionRule::new().alternatives(&ctx),
        vec![
            instant("2025-05-12T04:30:00Z"),
            instant("2025-05-12T08:30:00Z"),
            instant("2025-05-13T13:30:00Z"),
        ]
    );
}

#[rstest]
fn full_day_rule_moves_whole_days(poya: ObservancePeriod) {
    let ctx = context("2025-04-14T10:00:00Z", &poya, ZoneSpec::Utc);
    assert_eq!(
        FullDayRule.alternatives(&ctx),
        vec![
            instant("2025-04-15T10:00:00Z"),
            instant("2025-04-16T10:00:00Z"),
            instant("2025-04-13T10:00:00Z"),
        ]
    );
}

#[rstest]
fn festival_rule_prefers_following_days_then_morning(poya: ObservancePeriod) {
    let ctx = context("2025-10-20T19:00:00Z", &poya, ZoneSpec::Utc);
    assert_eq!(
        FestivalEveningRule::new().alternatives(&ctx),
        vec![
            instant("2025-10-21T19:00:00Z"),
            instant("2025-10-22T19:00:00Z"),
            instant("2025-10-20T10:00:00Z"),
        ]
    );
}

#[rstest]
fn generic_rule_shifts_by_hours(poya: ObservancePeriod) {
    let ctx = context("2025-07-01T10:30:00Z", &poya, ZoneSpec::Utc);
    assert_eq!(
        GenericRule.alternatives(&ctx),
        vec![
            instant("2025-07-01T12:30:00Z"),
            instant("2025-07-02T10:30:00Z"),
            instant("2025-07-01T08:30:00Z"),
            instant("2025-07-02T12:30:00Z"),
        ]
    );
}

#[rstest]
fn rule_text_names_the_observance(poya: ObservancePeriod) {
    let reason = EveningDevotionRule::new().reason(&poya);
    assert!(reason.contains("Vesak Poya"));
    assert!(reason.contains("sinhala-buddhist"));
    assert!(!EveningDevotionRule::new().guidance(&poya).is_empty());
    assert!(
        MorningContemplationRule::new()
            .reason(&poya)
            .contains("06:00-12:00")
    );
}

#[rstest]
#[case(ObservanceType::MONTHLY_RECURRING)]
#[case(ObservanceType::ANNUAL)]
#[case(ObservanceType::VARIABLE_DATE)]
#[case(ObservanceType::FESTIVAL)]
fn default_registry_covers_built_in_kinds(#[case] observance_type: ObservanceType) {
    assert!(WindowingRegistry::with_defaults().has_rule(&observance_type));
}

#[rstest]
fn unknown_kinds_fall_back_to_generic_rule(poya: ObservancePeriod) {
    let registry = WindowingRegistry::with_defaults();
    let pilgrimage = ObservanceType::new("pilgrimage").expect("valid observance type");
    assert!(!registry.has_rule(&pilgrimage));
    assert_eq!(
        registry.rule_for(&pilgrimage).reason(&poya),
        GenericRule.reason(&poya)
    );
    assert!(!WindowingRegistry::empty().has_rule(&ObservanceType::ANNUAL));
}

#[rstest]
fn registering_a_rule_replaces_the_previous_one(poya: ObservancePeriod) {
    let mut registry = WindowingRegistry::with_defaults();
    let previous = registry.register(ObservanceType::ANNUAL, GenericRule);
    assert!(previous.is_some());
    assert_eq!(
        registry.rule_for(&ObservanceType::ANNUAL).reason(&poya),
        GenericRule.reason(&poya)
    );
}
