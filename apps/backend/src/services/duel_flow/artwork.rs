use sea_orm::DatabaseTransaction;
use tracing::debug;

use super::DuelFlowService;
use crate::domain::ImageRef;
use crate::errors::domain::DomainError;
use crate::repos::{duels, rounds};

impl DuelFlowService {
    /// Attach a stored illustration to a round's outcome.
    pub async fn update_round_illustration(
        &self,
        txn: &DatabaseTransaction,
        round_id: i64,
        image_ref: &ImageRef,
    ) -> Result<(), DomainError> {
        let round = rounds::require_round(txn, round_id).await?;
        let mut outcome = round.outcome.ok_or_else(|| {
            DomainError::invalid_state(format!("Round {round_id} has no outcome to illustrate"))
        })?;
        outcome.illustration_ref = Some(image_ref.clone());
        rounds::write_outcome(txn, round_id, &outcome).await?;
        debug!(round_id, image_ref = %image_ref, "Round illustration attached");
        Ok(())
    }

    pub async fn update_featured_illustration(
        &self,
        txn: &DatabaseTransaction,
        duel_id: i64,
        image_ref: &ImageRef,
    ) -> Result<(), DomainError> {
        duels::set_featured_illustration(txn, duel_id, image_ref).await?;
        debug!(duel_id, image_ref = %image_ref, "Featured illustration set");
        Ok(())
    }
}
