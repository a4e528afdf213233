//! End-to-end delivery flows through the lifecycle service.

use super::helpers::{Engine, address, engine, epoch, newsletter, worker};
use chrono::TimeDelta;
use eyre::{Result, ensure, eyre};
use kalaya::{
    config::EngineConfig,
    delivery::{
        adapters::memory::ScriptedReply,
        domain::{DeliveryFailure, MessageStatus, RecipientDeliveryState, RecipientUpdate},
        services::{AttemptOutcome, MessageLifecycleError},
    },
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn message_travels_from_draft_to_engagement(engine: Engine) -> Result<()> {
    let queued = engine
        .enqueue(newsletter(&["priya@example.org", "kavya@example.org"]))
        .await?;

    let report = engine
        .service
        .process_next(&worker("dispatcher-1"))
        .await?
        .ok_or_else(|| eyre!("queued message should be claimable"))?;
    ensure!(report.outcome == AttemptOutcome::Sent, "dispatch should succeed");

    let later = epoch() + TimeDelta::minutes(2);
    for (recipient, state) in [
        ("priya@example.org", RecipientDeliveryState::Delivered),
        ("priya@example.org", RecipientDeliveryState::Opened),
        ("priya@example.org", RecipientDeliveryState::Clicked),
        ("kavya@example.org", RecipientDeliveryState::Delivered),
    ] {
        engine
            .service
            .record_recipient_event(queued.id(), &address(recipient), RecipientUpdate::new(state, later))
            .await?
            .ok_or_else(|| eyre!("{recipient} should accept {state:?}"))?;
    }
    let delivered = engine.service.mark_delivered(queued.id()).await?;

    let path: Vec<MessageStatus> = delivered
        .history()
        .iter()
        .map(|transition| transition.to)
        .collect();
    ensure!(
        path == vec![
            MessageStatus::Queued,
            MessageStatus::Sending,
            MessageStatus::Sent,
            MessageStatus::Delivered,
        ],
        "unexpected lifecycle path {path:?}"
    );
    ensure!(delivered.is_terminal(), "delivered messages are terminal");

    let summary = engine.service.recipient_summary(queued.id()).await?;
    ensure!(summary.total == 2, "two recipients tracked");
    ensure!(summary.delivered == 2, "both delivered");
    ensure!(summary.opened == 1 && summary.clicked == 1, "priya engaged");
    ensure!(summary.delivery_rate() == Some(1.0), "full delivery rate");

    let stats = engine.service.queue_stats().await?;
    ensure!(stats.delivered == 1 && stats.total() == 1, "one delivered message");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_retry_policy_governs_backoff_and_exhaustion() -> Result<()> {
    let config = EngineConfig::from_toml_str(
        r#"
        [retry]
        max_retries = 2
        base_retry_delay_secs = 60
        "#,
    )?;
    let engine = Engine::with_config(&config);
    let priya = address("priya@example.org");
    for _ in 0..2 {
        engine
            .transport
            .push_reply(&priya, ScriptedReply::reject(DeliveryFailure::transient("greylisted")));
    }
    let queued = engine.enqueue(newsletter(&["priya@example.org"])).await?;
    ensure!(queued.max_retries() == 2, "configured ceiling applies to new messages");

    let dispatcher = worker("dispatcher-1");
    let first = engine
        .service
        .process_next(&dispatcher)
        .await?
        .ok_or_else(|| eyre!("first attempt should run"))?;
    ensure!(
        first.outcome
            == AttemptOutcome::RetryScheduled {
                retry_at: epoch() + TimeDelta::seconds(60)
            },
        "first retry after the base delay, got {:?}",
        first.outcome
    );

    engine.clock.advance(TimeDelta::seconds(60));
    let second = engine
        .service
        .process_next(&dispatcher)
        .await?
        .ok_or_else(|| eyre!("retry should be due"))?;
    ensure!(
        matches!(second.outcome, AttemptOutcome::Exhausted(ref failure) if failure.is_transient()),
        "second failure exhausts the budget, got {:?}",
        second.outcome
    );
    ensure!(second.message.status() == MessageStatus::Failed, "message fails");
    ensure!(second.message.retry_count() == 2, "retry count hits the ceiling");
    ensure!(second.message.attempts().len() == 2, "both attempts recorded");

    engine.clock.advance(TimeDelta::days(2));
    ensure!(
        engine.service.process_next(&dispatcher).await?.is_none(),
        "failed messages are never retried"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn crashed_worker_lease_is_reclaimed(engine: Engine) -> Result<()> {
    let queued = engine.enqueue(newsletter(&["priya@example.org"])).await?;
    let crashed = engine
        .service
        .claim(queued.id(), &worker("dispatcher-1"))
        .await?;
    ensure!(
        engine
            .service
            .process_next(&worker("dispatcher-2"))
            .await?
            .is_none(),
        "a live lease hides the message"
    );

    let ttl = engine.service.lease_config().lease_ttl();
    engine.clock.advance(ttl);
    let recovered = engine
        .service
        .process_next(&worker("dispatcher-2"))
        .await?
        .ok_or_else(|| eyre!("expired lease should be reclaimable"))?;
    ensure!(recovered.outcome == AttemptOutcome::Sent, "recovery sends the message");
    ensure!(recovered.message.retry_count() == 0, "reclaiming is not a failure");

    let late = engine.service.attempt_delivery(crashed).await;
    ensure!(
        matches!(&late, Err(MessageLifecycleError::LeaseLost { worker, .. }) if worker.as_str() == "dispatcher-1"),
        "the crashed worker's attempt is rejected, got {late:?}"
    );
    let stored = engine
        .service
        .find(queued.id())
        .await?
        .ok_or_else(|| eyre!("message should be stored"))?;
    ensure!(stored.status() == MessageStatus::Sent, "the late attempt changes nothing");
    Ok(())
}
