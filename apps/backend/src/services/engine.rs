//! Duel engine facade: one transaction per operation, side effects after commit.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::{debug, warn};

use crate::collaborators::Collaborators;
use crate::config::EngineConfig;
use crate::db::{retry_on_lock, with_txn};
use crate::domain::{PlayerId, RoundOutcome, WizardId};
use crate::errors::domain::DomainError;
use crate::jobs::JobScheduler;
use crate::repos::{duels, rounds, Duel, Round};
use crate::services::duel_flow::{CreateDuel, DuelFlowService, DuelView, FlowOutput};
use crate::services::illustration::{
    generate_round_illustration, IllustrationRequest, IllustrationResult,
};

#[derive(Clone)]
pub struct DuelEngine {
    db: DatabaseConnection,
    collaborators: Collaborators,
    scheduler: Arc<dyn JobScheduler>,
    config: EngineConfig,
    flow: DuelFlowService,
}

impl DuelEngine {
    pub fn new(
        db: DatabaseConnection,
        collaborators: Collaborators,
        scheduler: Arc<dyn JobScheduler>,
        config: EngineConfig,
    ) -> Self {
        let flow = DuelFlowService::new(config.narrate_conclusion);
        Self {
            db,
            collaborators,
            scheduler,
            config,
            flow,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Hand off jobs and report final standings. Runs only after commit, so a
    /// failure here never undoes the transition that produced it.
    async fn dispatch<T>(&self, output: FlowOutput<T>) -> T {
        for job in output.jobs {
            debug!(?job, "scheduling job");
            self.scheduler.schedule(job);
        }
        for result in output.wizard_results {
            if let Err(err) = self
                .collaborators
                .wizards
                .record_wizard_result(&result.wizard_id, result.won, result.is_campaign)
                .await
            {
                warn!(wizard_id = %result.wizard_id, error = %err, "failed to record wizard result");
            }
        }
        output.value
    }

    pub async fn create_duel(&self, input: CreateDuel) -> Result<Duel, DomainError> {
        let flow = self.flow;
        let attempts = self.config.shortcode_max_attempts;
        let duel = with_txn(&self.db, move |txn| {
            Box::pin(async move { flow.create_duel(txn, input, attempts).await })
        })
        .await?;
        Ok(duel)
    }

    pub async fn join_duel(
        &self,
        duel_id: i64,
        player: PlayerId,
        wizards: Vec<WizardId>,
    ) -> Result<Duel, DomainError> {
        let flow = self.flow;
        retry_on_lock(self.config.max_lock_retries, || {
            let player = player.clone();
            let wizards = wizards.clone();
            with_txn(&self.db, move |txn| {
                Box::pin(async move { flow.join_duel(txn, duel_id, player, wizards).await })
            })
        })
        .await
    }

    pub async fn start_duel(&self, duel_id: i64) -> Result<Duel, DomainError> {
        let flow = self.flow;
        let output = retry_on_lock(self.config.max_lock_retries, || {
            with_txn(&self.db, move |txn| {
                Box::pin(async move { flow.start_duel(txn, duel_id).await })
            })
        })
        .await?;
        Ok(self.dispatch(output).await)
    }

    pub async fn complete_introduction(
        &self,
        duel_id: i64,
        outcome: Option<RoundOutcome>,
    ) -> Result<Duel, DomainError> {
        let flow = self.flow;
        let output = retry_on_lock(self.config.max_lock_retries, || {
            let outcome = outcome.clone();
            with_txn(&self.db, move |txn| {
                Box::pin(async move { flow.complete_introduction(txn, duel_id, outcome).await })
            })
        })
        .await?;
        Ok(self.dispatch(output).await)
    }

    pub async fn submit_action(
        &self,
        duel_id: i64,
        wizard: &WizardId,
        text: &str,
    ) -> Result<Round, DomainError> {
        let flow = self.flow;
        let output = retry_on_lock(self.config.max_lock_retries, || {
            let wizard = wizard.clone();
            let text = text.to_owned();
            with_txn(&self.db, move |txn| {
                Box::pin(async move { flow.submit_action(txn, duel_id, &wizard, &text).await })
            })
        })
        .await?;
        Ok(self.dispatch(output).await)
    }

    pub async fn retrigger_round(&self, round_id: i64) -> Result<Round, DomainError> {
        let flow = self.flow;
        let output = with_txn(&self.db, move |txn| {
            Box::pin(async move { flow.retrigger_round(txn, round_id).await })
        })
        .await?;
        Ok(self.dispatch(output).await)
    }

    pub async fn apply_outcome(
        &self,
        round_id: i64,
        outcome: RoundOutcome,
    ) -> Result<Round, DomainError> {
        let flow = self.flow;
        let output = retry_on_lock(self.config.max_lock_retries, || {
            let outcome = outcome.clone();
            with_txn(&self.db, move |txn| {
                Box::pin(async move { flow.apply_outcome(txn, round_id, outcome).await })
            })
        })
        .await?;
        Ok(self.dispatch(output).await)
    }

    pub async fn append_conclusion(&self, duel_id: i64) -> Result<Round, DomainError> {
        let flow = self.flow;
        let output = with_txn(&self.db, move |txn| {
            Box::pin(async move { flow.append_conclusion(txn, duel_id).await })
        })
        .await?;
        Ok(self.dispatch(output).await)
    }

    pub async fn cancel_duel(&self, duel_id: i64) -> Result<Duel, DomainError> {
        let flow = self.flow;
        retry_on_lock(self.config.max_lock_retries, || {
            with_txn(&self.db, move |txn| {
                Box::pin(async move { flow.cancel_duel(txn, duel_id).await })
            })
        })
        .await
    }

    pub async fn generate_round_illustration(
        &self,
        request: IllustrationRequest,
    ) -> IllustrationResult {
        generate_round_illustration(&self.db, &self.collaborators, request).await
    }

    /// Illustrate a completed round from its stored prompt, billed to the
    /// duel's creator. A round that already has an image is left alone.
    pub async fn illustrate_round(
        &self,
        duel_id: i64,
        round_number: u32,
    ) -> Result<IllustrationResult, DomainError> {
        let duel = duels::require_duel(&self.db, duel_id).await?;
        let round = rounds::find_by_duel_and_number(&self.db, duel_id, round_number)
            .await?
            .ok_or_else(|| {
                DomainError::round_not_found(format!(
                    "Round {round_number} of duel {duel_id} not found"
                ))
            })?;

        if let Some(existing) = round.illustration() {
            debug!(duel_id, round_number, "Round already illustrated");
            return Ok(IllustrationResult::stored(existing.clone()));
        }
        let Some(prompt) = round.outcome.as_ref().and_then(RoundOutcome::prompt) else {
            debug!(duel_id, round_number, "No illustration prompt");
            return Ok(IllustrationResult::text_only(None));
        };

        let request = IllustrationRequest {
            prompt: prompt.to_owned(),
            duel_id,
            round_number,
            backend: self.config.default_image_backend,
            user_id: duel.created_by,
            skip_image_generation: false,
        };
        Ok(self.generate_round_illustration(request).await)
    }

    pub async fn get_duel(&self, duel_id: i64) -> Result<DuelView, DomainError> {
        self.flow.get_duel(&self.db, duel_id).await
    }

    pub async fn get_duel_by_shortcode(&self, shortcode: &str) -> Result<DuelView, DomainError> {
        self.flow.get_duel_by_shortcode(&self.db, shortcode).await
    }

    pub async fn list_rounds(&self, duel_id: i64) -> Result<Vec<Round>, DomainError> {
        self.flow.list_rounds(&self.db, duel_id).await
    }
}
