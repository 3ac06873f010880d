//! Deferred work handed off from committed state transitions.
//!
//! Narration and illustration never run inside a transaction. Services return
//! the jobs they want, the engine schedules them after commit, and a worker
//! executes them with at-least-once semantics against idempotent handlers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::domain::DomainError;

pub mod queue;
pub mod recording;
pub mod runner;

pub use queue::{spawn_worker, JobReceiver, QueueScheduler, RetryPolicy};
pub use recording::RecordingScheduler;
pub use runner::JobRunner;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// Narrate round 0 and open round 1.
    IntroduceDuel { duel_id: i64 },
    /// Resolve a PROCESSING round (including a CONCLUSION round).
    NarrateRound { round_id: i64 },
    /// Render and attach the illustration for a completed round.
    IllustrateRound { duel_id: i64, round_number: u32 },
}

/// Fire-and-forget job submission. Must not block.
pub trait JobScheduler: Send + Sync {
    fn schedule(&self, job: Job);
}

/// Executes a single job.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> Result<(), DomainError>;
}

/// Drops every job; used when scheduled work is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledScheduler;

impl JobScheduler for DisabledScheduler {
    fn schedule(&self, job: Job) {
        tracing::debug!(?job, "scheduled jobs disabled; dropping job");
    }
}
