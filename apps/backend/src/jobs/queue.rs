//! Tokio-backed job queue with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use super::{Job, JobHandler, JobScheduler};

pub type JobReceiver = mpsc::UnboundedReceiver<Job>;

#[derive(Debug, Clone)]
pub struct QueueScheduler {
    tx: mpsc::UnboundedSender<Job>,
}

impl QueueScheduler {
    pub fn new() -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl JobScheduler for QueueScheduler {
    fn schedule(&self, job: Job) {
        if let Err(err) = self.tx.send(job) {
            warn!(job = ?err.0, "job queue closed; job dropped");
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

/// Drain the queue until it closes or `shutdown` fires. Each job runs in its
/// own task so a slow narrator call does not hold up illustrations.
pub fn spawn_worker(
    mut rx: JobReceiver,
    handler: Arc<dyn JobHandler>,
    policy: RetryPolicy,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("job worker started");
        loop {
            let job = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = rx.recv() => match next {
                    Some(job) => job,
                    None => break,
                },
            };

            let handler = Arc::clone(&handler);
            let span = tracing::info_span!("job", job = ?job);
            tokio::spawn(run_with_retry(job, handler, policy).instrument(span));
        }
        info!("job worker stopped");
    })
}

async fn run_with_retry(job: Job, handler: Arc<dyn JobHandler>, policy: RetryPolicy) {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match handler.handle(&job).await {
            Ok(()) => {
                debug!(attempt, "job finished");
                return;
            }
            Err(err) if attempt < attempts => {
                warn!(attempt, error = %err, "job failed; retrying");
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            Err(err) => {
                error!(attempt, error = %err, "job failed; giving up");
            }
        }
    }
}
