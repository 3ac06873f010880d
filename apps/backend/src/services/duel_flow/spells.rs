use sea_orm::DatabaseTransaction;
use tracing::{debug, info};

use super::{DuelFlowService, FlowOutput};
use crate::domain::{DuelStatus, RoundStatus, SpellEntry, WizardId};
use crate::errors::domain::{DomainError, ValidationKind};
use crate::jobs::Job;
use crate::repos::{duels, rounds, DuelChanges, Round};

impl DuelFlowService {
    /// Record a wizard's spell for the current round.
    ///
    /// The pending-actor removal is a version-guarded duel update, so of two
    /// concurrent last submitters exactly one sees the emptied set and flips
    /// the round to PROCESSING; the other retries against fresh state.
    pub async fn submit_action(
        &self,
        txn: &DatabaseTransaction,
        duel_id: i64,
        wizard: &WizardId,
        text: &str,
    ) -> Result<FlowOutput<Round>, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::EmptySpell,
                "Spell text must not be empty",
            ));
        }

        let duel = duels::require_duel(txn, duel_id).await?;
        if duel.status != DuelStatus::InProgress {
            return Err(DomainError::invalid_state(format!(
                "Duel {duel_id} is not in progress"
            )));
        }
        Self::require_member(&duel, wizard)?;

        let round = rounds::find_by_duel_and_number(txn, duel_id, duel.current_round)
            .await?
            .ok_or_else(|| {
                DomainError::round_not_found(format!(
                    "Round {} of duel {duel_id} not found",
                    duel.current_round
                ))
            })?;
        if round.status != RoundStatus::WaitingForSpells {
            return Err(DomainError::invalid_state(format!(
                "Round {} is no longer accepting spells",
                round.round_number
            )));
        }

        let mut pending = duel.pending_actors.clone();
        pending.remove(wizard);
        let all_acted = pending.is_empty();
        duels::update_duel(txn, &duel, DuelChanges::new().pending_actors(pending)).await?;

        // Re-read after the guard so concurrent writers' spells are kept.
        let mut round = rounds::require_round(txn, round.id).await?;
        round.spells.insert(
            wizard.clone(),
            SpellEntry {
                text: text.to_string(),
                submitted_at: time::OffsetDateTime::now_utc(),
            },
        );
        if !rounds::write_spells(txn, round.id, &round.spells).await? {
            return Err(DomainError::invalid_state(format!(
                "Round {} closed while submitting",
                round.round_number
            )));
        }
        debug!(duel_id, round_id = round.id, wizard_id = %wizard, "Spell recorded");

        if !all_acted {
            return Ok(FlowOutput::new(round));
        }

        let flipped = rounds::transition(
            txn,
            round.id,
            RoundStatus::WaitingForSpells,
            RoundStatus::Processing,
            None,
        )
        .await?;
        if !flipped {
            return Ok(FlowOutput::new(round));
        }

        round.status = RoundStatus::Processing;
        info!(duel_id, round_id = round.id, round_number = round.round_number, "All spells in; round processing");
        let round_id = round.id;
        Ok(FlowOutput::new(round).with_job(Job::NarrateRound { round_id }))
    }

    /// Re-schedule narration for a round stuck in PROCESSING.
    pub async fn retrigger_round(
        &self,
        txn: &DatabaseTransaction,
        round_id: i64,
    ) -> Result<FlowOutput<Round>, DomainError> {
        let round = rounds::require_round(txn, round_id).await?;
        if round.status != RoundStatus::Processing {
            return Err(DomainError::invalid_state(format!(
                "Round {round_id} is {:?}, not PROCESSING",
                round.status
            )));
        }
        info!(round_id, "Re-triggering round narration");
        Ok(FlowOutput::new(round).with_job(Job::NarrateRound { round_id }))
    }
}
