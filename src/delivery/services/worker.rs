//! Pool of tokio workers that drain the ready queue.

use crate::delivery::{
    domain::{DeliveryDomainError, WorkerId},
    ports::{MessageRepository, MessageTransport, RecipientStatusStore},
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::watch, task::JoinSet};
use tracing::{debug, error, info};

use super::lifecycle::{AttemptOutcome, MessageLifecycleService};

mod defaults {
    pub const fn workers() -> usize {
        4
    }

    pub const fn poll_interval_ms() -> u64 {
        500
    }

    pub const fn claim_batch() -> usize {
        16
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent workers.
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Idle wait between polls when the queue is empty, in milliseconds.
    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Ready messages inspected per claim.
    #[serde(default = "defaults::claim_batch")]
    pub claim_batch: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: defaults::workers(),
            poll_interval_ms: defaults::poll_interval_ms(),
            claim_batch: defaults::claim_batch(),
        }
    }
}

impl WorkerConfig {
    /// Returns the idle poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Counts of what one worker did before it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker identity.
    pub worker: WorkerId,
    /// Attempts that ended sent.
    pub sent: u64,
    /// Attempts that ended with a retry scheduled.
    pub retried: u64,
    /// Attempts that ended terminally failed.
    pub failed: u64,
    /// Errors other than losing a race.
    pub errors: u64,
}

impl WorkerReport {
    const fn new(worker: WorkerId) -> Self {
        Self {
            worker,
            sent: 0,
            retried: 0,
            failed: 0,
            errors: 0,
        }
    }

    /// Returns the number of completed attempts.
    #[must_use]
    pub const fn attempts(&self) -> u64 {
        self.sent
            .saturating_add(self.retried)
            .saturating_add(self.failed)
    }

    const fn record(&mut self, outcome: &AttemptOutcome) {
        match outcome {
            AttemptOutcome::Sent => self.sent = self.sent.saturating_add(1),
            AttemptOutcome::RetryScheduled { .. } => self.retried = self.retried.saturating_add(1),
            AttemptOutcome::Exhausted(_) | AttemptOutcome::Rejected(_) => {
                self.failed = self.failed.saturating_add(1);
            }
        }
    }
}

/// Running set of delivery workers.
///
/// Each worker repeatedly claims the next ready message and attempts
/// delivery. Workers idle for the poll interval when nothing is ready and
/// stop once [`Self::shutdown`] is called, finishing any attempt in flight.
#[derive(Debug)]
pub struct DeliveryWorkerPool {
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<WorkerReport>,
}

impl DeliveryWorkerPool {
    /// Spawns `config.workers` workers named `{prefix}-{n}`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::EmptyWorkerId`] when `prefix` is blank.
    pub fn spawn<R, S, T, C>(
        lifecycle: &Arc<MessageLifecycleService<R, S, T, C>>,
        config: &WorkerConfig,
        prefix: &str,
    ) -> Result<Self, DeliveryDomainError>
    where
        R: MessageRepository + 'static,
        S: RecipientStatusStore + 'static,
        T: MessageTransport + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let stem = prefix.trim();
        if stem.is_empty() {
            return Err(DeliveryDomainError::EmptyWorkerId);
        }
        let (shutdown, receiver) = watch::channel(false);
        let mut tasks = JoinSet::new();
        for index in 1..=config.workers.max(1) {
            let worker = WorkerId::new(format!("{stem}-{index}"))?;
            tasks.spawn(run_worker(
                Arc::clone(lifecycle),
                worker,
                config.poll_interval(),
                receiver.clone(),
            ));
        }
        info!(workers = tasks.len(), "delivery workers started");
        Ok(Self { shutdown, tasks })
    }

    /// Returns the number of running workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` when no workers are running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signals every worker to stop and waits for them.
    ///
    /// Reports are returned in completion order; a worker that panicked is
    /// logged and omitted.
    pub async fn shutdown(mut self) -> Vec<WorkerReport> {
        if self.shutdown.send(true).is_err() {
            debug!("delivery workers already stopped");
        }
        let mut reports = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(err) => error!(error = %err, "delivery worker aborted"),
            }
        }
        info!(workers = reports.len(), "delivery workers stopped");
        reports
    }
}

async fn run_worker<R, S, T, C>(
    lifecycle: Arc<MessageLifecycleService<R, S, T, C>>,
    worker: WorkerId,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> WorkerReport
where
    R: MessageRepository,
    S: RecipientStatusStore,
    T: MessageTransport,
    C: Clock + Send + Sync,
{
    let mut report = WorkerReport::new(worker.clone());
    loop {
        if *shutdown.borrow() {
            break;
        }
        match lifecycle.process_next(&worker).await {
            Ok(Some(attempt)) => {
                report.record(&attempt.outcome);
                continue;
            }
            Ok(None) => {}
            Err(err) if err.is_contention() => {
                debug!(%worker, error = %err, "message taken by another worker");
                continue;
            }
            Err(err) => {
                report.errors = report.errors.saturating_add(1);
                error!(%worker, error = %err, "delivery attempt failed");
            }
        }

        tokio::select! {
            () = tokio::time::sleep(poll_interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!(%worker, attempts = report.attempts(), "delivery worker stopped");
    report
}
