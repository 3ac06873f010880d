use std::collections::BTreeSet;

use sea_orm::DatabaseTransaction;
use tracing::{info, warn};

use super::{kind_for_round, DuelFlowService, FlowOutput, WizardResult};
use crate::domain::{
    evaluate, DuelStatus, EndDecision, RoundKind, RoundOutcome, RoundStatus, Standings,
};
use crate::errors::domain::DomainError;
use crate::jobs::Job;
use crate::repos::{duels, rounds, Duel, DuelChanges, Round};

fn illustration_job(duel_id: i64, round: &Round, outcome: &RoundOutcome) -> Option<Job> {
    outcome.prompt().map(|_| Job::IllustrateRound {
        duel_id,
        round_number: round.round_number,
    })
}

impl DuelFlowService {
    /// Apply a resolved outcome to its round and the duel.
    ///
    /// Idempotent: a COMPLETED round is returned unchanged, and only the caller
    /// that flips PROCESSING -> COMPLETED applies deltas.
    pub async fn apply_outcome(
        &self,
        txn: &DatabaseTransaction,
        round_id: i64,
        outcome: RoundOutcome,
    ) -> Result<FlowOutput<Round>, DomainError> {
        let round = rounds::require_round(txn, round_id).await?;

        match round.status {
            RoundStatus::Completed => {
                info!(round_id, "Outcome already applied; ignoring");
                return Ok(FlowOutput::new(round));
            }
            RoundStatus::WaitingForSpells => {
                return Err(DomainError::invalid_state(format!(
                    "Round {round_id} is still waiting for spells"
                )));
            }
            RoundStatus::Processing => {}
        }

        let completed = rounds::transition(
            txn,
            round_id,
            RoundStatus::Processing,
            RoundStatus::Completed,
            Some(&outcome),
        )
        .await?;
        if !completed {
            return Ok(FlowOutput::new(rounds::require_round(txn, round_id).await?));
        }

        let duel = duels::require_duel(txn, round.duel_id).await?;
        let mut output = FlowOutput::new(rounds::require_round(txn, round_id).await?);
        output.jobs.extend(illustration_job(duel.id, &round, &outcome));

        if round.kind == RoundKind::Conclusion {
            info!(duel_id = duel.id, round_id, "Conclusion recorded");
            return Ok(output);
        }
        if duel.status != DuelStatus::InProgress {
            warn!(duel_id = duel.id, status = ?duel.status, "Outcome recorded for inactive duel; not advancing");
            return Ok(output);
        }

        let mut points = duel.points.clone();
        let mut hit_points = duel.hit_points.clone();
        for (wizard, delta) in outcome.points_awarded.iter().flatten() {
            if duel.has_wizard(wizard) {
                points.award(wizard, *delta);
            } else {
                warn!(duel_id = duel.id, wizard_id = %wizard, "Points for unknown wizard ignored");
            }
        }
        for (wizard, delta) in outcome.health_delta.iter().flatten() {
            if duel.has_wizard(wizard) {
                hit_points.apply_delta(wizard, *delta);
            } else {
                warn!(duel_id = duel.id, wizard_id = %wizard, "Health delta for unknown wizard ignored");
            }
        }

        let decision = evaluate(
            Standings {
                wizards: &duel.wizards,
                points: &points,
                hit_points: &hit_points,
            },
            duel.round_limit,
            round.round_number,
        );

        match decision {
            EndDecision::End {
                reason,
                winners,
                losers,
            } => {
                let changes = DuelChanges::new()
                    .status(DuelStatus::Completed)
                    .scores(points, hit_points)
                    .pending_actors(BTreeSet::new())
                    .result(winners.clone(), losers.clone())
                    .ended_at(time::OffsetDateTime::now_utc());
                let duel = duels::update_duel(txn, &duel, changes).await?;
                info!(duel_id = duel.id, ?reason, ?winners, "Duel completed");

                output.wizard_results = duel
                    .wizards
                    .iter()
                    .map(|w| WizardResult {
                        wizard_id: w.clone(),
                        won: winners.contains(w),
                        is_campaign: duel.is_campaign,
                    })
                    .collect();

                if self.narrate_conclusion {
                    let conclusion = self.open_conclusion(txn, &duel).await?;
                    output.jobs.push(Job::NarrateRound {
                        round_id: conclusion.id,
                    });
                }
            }
            EndDecision::Continue => {
                let next = round.round_number + 1;
                rounds::create_round(
                    txn,
                    duel.id,
                    next,
                    kind_for_round(duel.round_limit, next),
                    RoundStatus::WaitingForSpells,
                    None,
                )
                .await?;
                let changes = DuelChanges::new()
                    .scores(points, hit_points)
                    .current_round(next)
                    .pending_actors(duel.wizards.iter().cloned().collect());
                duels::update_duel(txn, &duel, changes).await?;
                info!(duel_id = duel.id, round_number = next, "Next round open");
            }
        }

        Ok(output)
    }

    /// Append a narrated CONCLUSION round to a completed duel.
    pub async fn append_conclusion(
        &self,
        txn: &DatabaseTransaction,
        duel_id: i64,
    ) -> Result<FlowOutput<Round>, DomainError> {
        let duel = duels::require_duel(txn, duel_id).await?;
        let round = self.open_conclusion(txn, &duel).await?;
        let round_id = round.id;
        Ok(FlowOutput::new(round).with_job(Job::NarrateRound { round_id }))
    }

    async fn open_conclusion(
        &self,
        txn: &DatabaseTransaction,
        duel: &Duel,
    ) -> Result<Round, DomainError> {
        if duel.status != DuelStatus::Completed {
            return Err(DomainError::invalid_state(format!(
                "Duel {} has not completed",
                duel.id
            )));
        }

        let existing = rounds::list_for_duel(txn, duel.id).await?;
        if existing.iter().any(|r| r.kind == RoundKind::Conclusion) {
            return Err(DomainError::invalid_state(format!(
                "Duel {} already has a conclusion",
                duel.id
            )));
        }
        let next = existing.last().map_or(0, |r| r.round_number + 1);

        rounds::create_round(
            txn,
            duel.id,
            next,
            RoundKind::Conclusion,
            RoundStatus::Processing,
            None,
        )
        .await
    }
}
