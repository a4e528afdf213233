//! Worker pools draining a mixed queue.

use super::helpers::{Engine, address, newsletter};
use eyre::{Result, ensure};
use kalaya::{
    config::EngineConfig,
    delivery::{
        adapters::memory::ScriptedReply,
        domain::{DeliveryFailure, QueueStats},
        services::DeliveryWorkerPool,
    },
};
use std::time::Duration;

async fn wait_for(engine: &Engine, done: impl Fn(&QueueStats) -> bool) -> Result<QueueStats> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let stats = engine.service.queue_stats().await?;
        if done(&stats) {
            return Ok(stats);
        }
        ensure!(
            tokio::time::Instant::now() < deadline,
            "queue did not settle: {stats:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn configured_pool_settles_every_message() -> Result<()> {
    let config = EngineConfig::from_toml_str(
        r#"
        [worker]
        workers = 3
        poll_interval_ms = 10
        claim_batch = 4
        "#,
    )?;
    let engine = Engine::with_config(&config);
    engine.transport.push_reply(
        &address("bounced@example.org"),
        ScriptedReply::reject(DeliveryFailure::permanent("mailbox does not exist")),
    );
    engine.transport.push_reply(
        &address("busy@example.org"),
        ScriptedReply::reject(DeliveryFailure::transient("try again later")),
    );
    for recipient in [
        "priya@example.org",
        "kavya@example.org",
        "arun@example.org",
        "meena@example.org",
        "bounced@example.org",
        "busy@example.org",
    ] {
        engine.enqueue(newsletter(&[recipient])).await?;
    }

    let pool = DeliveryWorkerPool::spawn(&engine.service, &config.worker, "dispatcher")?;
    ensure!(pool.len() == 3, "the configured worker count starts");
    let settled = wait_for(&engine, |stats| {
        stats.sent == 4
            && stats.failed == 1
            && stats.sending == 0
            && engine.transport.calls().len() == 6
    })
    .await?;
    let reports = pool.shutdown().await;

    ensure!(settled.queued == 1, "the transient failure waits for its retry");
    let sent: u64 = reports.iter().map(|report| report.sent).sum();
    let retried: u64 = reports.iter().map(|report| report.retried).sum();
    let failed: u64 = reports.iter().map(|report| report.failed).sum();
    ensure!(
        (sent, retried, failed) == (4, 1, 1),
        "unexpected totals sent={sent} retried={retried} failed={failed}"
    );
    ensure!(
        reports.iter().all(|report| report.errors == 0),
        "contention is never reported as an error: {reports:?}"
    );
    ensure!(
        engine.transport.calls_to(&address("busy@example.org")) == 1,
        "the retry is not due yet"
    );
    Ok(())
}
