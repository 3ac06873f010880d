use std::sync::Arc;
use std::time::Duration;

use db_infra::{bootstrap_db, DbInfraError, DbKind};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::collaborators::Collaborators;
use crate::config::EngineConfig;
use crate::error::AppError;
use crate::jobs::{spawn_worker, DisabledScheduler, JobRunner, JobScheduler, QueueScheduler, RetryPolicy};
use crate::services::DuelEngine;
use crate::state::app_state::AppState;

/// Builder for [`AppState`], shared by the binary and the tests.
///
/// Without an explicit scheduler, jobs go to a tokio worker when
/// `run_scheduled_jobs` is set and are dropped otherwise.
pub struct StateBuilder {
    db_kind: DbKind,
    db: Option<DatabaseConnection>,
    collaborators: Option<Collaborators>,
    scheduler: Option<Arc<dyn JobScheduler>>,
    config: EngineConfig,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            db_kind: DbKind::SqliteMemory,
            db: None,
            collaborators: None,
            scheduler: None,
            config: EngineConfig::default(),
        }
    }

    pub fn with_db(mut self, kind: DbKind) -> Self {
        self.db_kind = kind;
        self
    }

    /// Use an already migrated connection instead of bootstrapping one.
    pub fn with_connection(mut self, db: DatabaseConnection) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = Some(collaborators);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn JobScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let collaborators = self
            .collaborators
            .ok_or_else(|| AppError::config("collaborators must be configured"))?;
        let db = match self.db {
            Some(db) => db,
            None => bootstrap_db(self.db_kind).await.map_err(infra_error)?,
        };
        let shutdown = CancellationToken::new();

        if let Some(scheduler) = self.scheduler {
            let engine = DuelEngine::new(db, collaborators, scheduler, self.config);
            return Ok(AppState::new(engine, shutdown));
        }

        if !self.config.run_scheduled_jobs {
            info!("scheduled jobs disabled");
            let engine = DuelEngine::new(db, collaborators, Arc::new(DisabledScheduler), self.config);
            return Ok(AppState::new(engine, shutdown));
        }

        let policy = RetryPolicy {
            max_attempts: self.config.job_max_attempts,
            backoff: Duration::from_millis(self.config.job_retry_backoff_ms),
        };
        let (scheduler, rx) = QueueScheduler::new();
        let engine = DuelEngine::new(db, collaborators, Arc::new(scheduler), self.config);
        spawn_worker(
            rx,
            Arc::new(JobRunner::new(engine.clone())),
            policy,
            shutdown.child_token(),
        );
        Ok(AppState::new(engine, shutdown))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

fn infra_error(err: DbInfraError) -> AppError {
    match err {
        DbInfraError::Config { message } => AppError::config(message),
        DbInfraError::Connect { message } => AppError::DbUnavailable { detail: message },
        DbInfraError::Migration { message } => AppError::internal(message),
    }
}
