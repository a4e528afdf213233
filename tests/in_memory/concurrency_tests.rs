//! Concurrent claims and recipient updates against one shared engine.

use super::helpers::{Engine, address, engine, newsletter, worker};
use eyre::{Result, ensure};
use kalaya::delivery::{
    domain::{MessageId, MessageStatus, RecipientDeliveryState, RecipientUpdate},
    services::MessageLifecycleError,
};
use rstest::rstest;
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_workers_yield_exactly_one_lease(engine: Engine) -> Result<()> {
    for round in 0..20 {
        let queued = engine
            .enqueue(newsletter(&[&format!("member{round}@example.org")]))
            .await?;
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let mut racers = JoinSet::new();
        for name in ["dispatcher-a", "dispatcher-b"] {
            let service = Arc::clone(&engine.service);
            let start = Arc::clone(&barrier);
            let id = queued.id();
            racers.spawn(async move {
                start.wait().await;
                service.claim(id, &worker(name)).await
            });
        }

        let mut winners = 0;
        let mut losers = 0;
        while let Some(joined) = racers.join_next().await {
            match joined? {
                Ok(claim) => {
                    ensure!(claim.message.status() == MessageStatus::Sending, "winner holds a sending message");
                    winners += 1;
                }
                Err(err) if err.is_contention() => losers += 1,
                Err(err) => return Err(err.into()),
            }
        }
        ensure!(
            winners == 1 && losers == 1,
            "round {round}: expected one winner and one loser, got {winners} and {losers}"
        );
    }

    let acquired = engine
        .events
        .names()
        .into_iter()
        .filter(|name| *name == "lease_acquired")
        .count();
    ensure!(acquired == 20, "one lease per message, saw {acquired}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claim_next_never_hands_out_a_message_twice(engine: Engine) -> Result<()> {
    let mut expected = HashSet::new();
    for index in 0..12 {
        let queued = engine
            .enqueue(newsletter(&[&format!("reader{index}@example.org")]))
            .await?;
        expected.insert(queued.id());
    }

    let mut pollers = JoinSet::new();
    for index in 0..4 {
        let service = Arc::clone(&engine.service);
        pollers.spawn(async move {
            let me = worker(&format!("dispatcher-{index}"));
            let mut claimed = Vec::new();
            while let Some(claim) = service.claim_next(&me).await? {
                claimed.push(claim.message.id());
            }
            Ok::<_, MessageLifecycleError>(claimed)
        });
    }

    let mut seen: Vec<MessageId> = Vec::new();
    while let Some(joined) = pollers.join_next().await {
        seen.extend(joined??);
    }
    let unique: HashSet<MessageId> = seen.iter().copied().collect();
    ensure!(unique.len() == seen.len(), "a message was claimed twice: {seen:?}");
    ensure!(unique == expected, "every message should be claimed once");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn recipient_callbacks_apply_concurrently(engine: Engine) -> Result<()> {
    let readers: Vec<String> = (0..16).map(|n| format!("reader{n}@example.org")).collect();
    let borrowed: Vec<&str> = readers.iter().map(String::as_str).collect();
    let queued = engine.enqueue(newsletter(&borrowed)).await?;
    engine
        .service
        .process_next(&worker("dispatcher-1"))
        .await?;

    let mut callbacks = JoinSet::new();
    for reader in &readers {
        let service = Arc::clone(&engine.service);
        let recipient = address(reader);
        let id = queued.id();
        let at = engine.clock.utc();
        callbacks.spawn(async move {
            service
                .record_recipient_event(
                    id,
                    &recipient,
                    RecipientUpdate::new(RecipientDeliveryState::Delivered, at),
                )
                .await
        });
    }
    while let Some(joined) = callbacks.join_next().await {
        ensure!(joined??.is_some(), "every forward update applies");
    }

    let summary = engine.service.recipient_summary(queued.id()).await?;
    ensure!(summary.delivered == 16, "all recipients delivered: {summary:?}");
    ensure!(engine.recipients.len() == 16, "one record per recipient");
    Ok(())
}
