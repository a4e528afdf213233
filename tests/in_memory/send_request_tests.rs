//! Culturally scheduled sends for diaspora audiences.

use super::helpers::{
    Engine, MemorySendRequests, at, community, newsletter, observance, scheduler, worker,
};
use eyre::{Result, ensure, eyre};
use kalaya::{
    config::EngineConfig,
    delivery::{
        domain::MessageStatus,
        services::{AttemptOutcome, SendOutcome, SendRequestService},
    },
    scheduling::{
        domain::{
            DiasporaProfile, Location, ObservancePeriod, ObservanceType, ResolutionStrategy,
            Severity,
        },
        services::ScheduleRequest,
    },
};
use std::sync::Arc;

/// Pournami mornings in Colombo run 06:00-12:00 local, 00:30-06:30 UTC.
fn colombo_pournami() -> ObservancePeriod {
    observance(
        "Pournami",
        "tamil-hindu",
        ObservanceType::MONTHLY_RECURRING,
        ("2025-03-14T00:30:00Z", "2025-03-14T06:30:00Z"),
        Severity::Medium,
    )
}

fn colombo_audience() -> ScheduleRequest {
    ScheduleRequest::new(
        at("2025-03-14T02:30:00Z"),
        [DiasporaProfile::new(
            Location::city("Colombo"),
            [community("tamil-hindu")],
        )],
    )
}

fn front_desk(config: &EngineConfig) -> (Engine, MemorySendRequests) {
    let engine = Engine::with_config(config);
    let requests = SendRequestService::new(
        Arc::new(scheduler(config, [colombo_pournami()])),
        Arc::clone(&engine.service),
    );
    (engine, requests)
}

#[tokio::test(flavor = "multi_thread")]
async fn colombo_morning_send_moves_to_local_afternoon() -> Result<()> {
    let (engine, requests) = front_desk(&EngineConfig::default());
    let outcome = requests
        .request_send(newsletter(&["priya@example.org"]), &colombo_audience())
        .await?;

    let SendOutcome::Queued { message, decision } = outcome else {
        return Err(eyre!("a medium conflict should be resolved automatically"));
    };
    let afternoon = at("2025-03-14T08:30:00Z");
    ensure!(decision.was_adjusted, "the morning send should move");
    ensure!(
        decision.approved_time == afternoon,
        "expected 14:00 in Colombo, got {}",
        decision.approved_time
    );
    ensure!(
        decision.conflict.strategy == ResolutionStrategy::FlexibleRescheduling,
        "medium conflicts are flexible"
    );
    ensure!(message.scheduled_send_time() == afternoon, "queued for the afternoon");

    let dispatcher = worker("dispatcher-1");
    engine.clock.set(at("2025-03-14T08:29:59Z"));
    ensure!(
        engine.service.process_next(&dispatcher).await?.is_none(),
        "nothing goes out before the approved time"
    );
    engine.clock.set(afternoon);
    let report = engine
        .service
        .process_next(&dispatcher)
        .await?
        .ok_or_else(|| eyre!("the afternoon send should be due"))?;
    ensure!(report.outcome == AttemptOutcome::Sent, "the send succeeds");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn strict_ceiling_holds_medium_conflicts_for_confirmation() -> Result<()> {
    let config = EngineConfig::from_toml_str(
        r#"
        [scheduling]
        auto_resolve_ceiling = "low"
        "#,
    )?;
    let (engine, requests) = front_desk(&config);
    let outcome = requests
        .request_send(newsletter(&["priya@example.org"]), &colombo_audience())
        .await?;

    let SendOutcome::AwaitingConfirmation { message, decision } = outcome else {
        return Err(eyre!("conflicts above the ceiling need a person"));
    };
    ensure!(!decision.was_adjusted, "held sends keep the requested time");
    ensure!(
        !decision.conflict.alternatives.is_empty(),
        "alternatives are still offered"
    );
    ensure!(message.status() == MessageStatus::Pending, "held messages stay pending");

    let chosen = at("2025-03-14T10:30:00Z");
    let confirmed = requests
        .confirm_send(message.id(), chosen, "approved by the outreach lead")
        .await?;
    ensure!(confirmed.status() == MessageStatus::Queued, "confirmation queues");
    ensure!(confirmed.scheduled_send_time() == chosen, "the chosen time is used");

    engine.clock.set(chosen);
    ensure!(
        engine
            .service
            .process_next(&worker("dispatcher-1"))
            .await?
            .is_some(),
        "the confirmed send goes out at the chosen time"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn raised_flag_floor_ignores_minor_observances() -> Result<()> {
    let config = EngineConfig::from_toml_str(
        r#"
        [scheduling]
        flag_floor = "high"
        auto_resolve_ceiling = "high"
        "#,
    )?;
    let (_engine, requests) = front_desk(&config);
    let audience = colombo_audience();
    let outcome = requests
        .request_send(newsletter(&["priya@example.org"]), &audience)
        .await?;

    ensure!(
        matches!(outcome, SendOutcome::Queued { .. }),
        "unflagged observances do not hold sends"
    );
    ensure!(!outcome.decision().conflict.has_conflict, "no conflict is reported");
    ensure!(
        outcome.message().scheduled_send_time() == audience.requested_time,
        "the requested time stands"
    );
    Ok(())
}
