use std::collections::BTreeSet;

use sea_orm::DatabaseTransaction;
use tracing::{debug, info, warn};

use super::{kind_for_round, CreateDuel, DuelFlowService, FlowOutput};
use crate::domain::{DuelStatus, PlayerId, RoundLimit, RoundOutcome, RoundStatus, WizardId};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::jobs::Job;
use crate::repos::{duels, rounds, Duel, DuelChanges, NewDuel};
use crate::utils::shortcode::generate_shortcode;

pub(super) const INTRODUCTION_ROUND: u32 = 0;
pub(super) const FIRST_ROUND: u32 = 1;

fn validate_new_wizards(existing: &[WizardId], incoming: &[WizardId]) -> Result<(), DomainError> {
    if incoming.is_empty() {
        return Err(DomainError::validation(
            ValidationKind::EmptyRoster,
            "At least one wizard is required",
        ));
    }
    let mut seen: BTreeSet<&WizardId> = existing.iter().collect();
    for wizard in incoming {
        if wizard.as_str().trim().is_empty() {
            return Err(DomainError::validation(
                ValidationKind::Other("EMPTY_WIZARD_ID".into()),
                "Wizard ids must not be empty",
            ));
        }
        if !seen.insert(wizard) {
            return Err(DomainError::validation(
                ValidationKind::DuplicateWizard,
                format!("Wizard {wizard} is already in the duel"),
            ));
        }
    }
    Ok(())
}

impl DuelFlowService {
    /// Create a duel awaiting players, with a fresh unique shortcode.
    pub async fn create_duel(
        &self,
        txn: &DatabaseTransaction,
        input: CreateDuel,
        shortcode_max_attempts: u32,
    ) -> Result<Duel, DomainError> {
        if input.round_limit == RoundLimit::FixedRounds(0) {
            return Err(DomainError::validation(
                ValidationKind::InvalidRoundLimit,
                "A fixed round limit must be at least 1",
            ));
        }
        validate_new_wizards(&[], &input.wizards)?;

        let mut shortcode = None;
        for _ in 0..shortcode_max_attempts.max(1) {
            let candidate = generate_shortcode();
            if !duels::shortcode_exists(txn, &candidate).await? {
                shortcode = Some(candidate);
                break;
            }
            debug!(candidate = %candidate, "shortcode collision, redrawing");
        }
        let shortcode = shortcode.ok_or_else(|| {
            DomainError::conflict(
                ConflictKind::ShortcodeExhausted,
                "Could not allocate a unique shortcode",
            )
        })?;

        let duel = duels::create_duel(
            txn,
            NewDuel {
                shortcode,
                round_limit: input.round_limit,
                wizards: input.wizards,
                players: input.players,
                is_campaign: input.is_campaign,
                created_by: input.created_by,
            },
        )
        .await?;

        info!(duel_id = duel.id, shortcode = %duel.shortcode, "Duel created");
        Ok(duel)
    }

    /// Add a player and their wizards to a duel still awaiting players.
    pub async fn join_duel(
        &self,
        txn: &DatabaseTransaction,
        duel_id: i64,
        player: PlayerId,
        wizards: Vec<WizardId>,
    ) -> Result<Duel, DomainError> {
        let duel = duels::require_duel(txn, duel_id).await?;

        if duel.status != DuelStatus::WaitingForPlayers || duel.started_at.is_some() {
            return Err(DomainError::invalid_state(format!(
                "Duel {duel_id} is no longer accepting players"
            )));
        }
        if duel.players.contains(&player) {
            return Err(DomainError::duplicate_player(format!(
                "Player {player} already joined duel {duel_id}"
            )));
        }
        validate_new_wizards(&duel.wizards, &wizards)?;

        let mut points = duel.points.clone();
        let mut hit_points = duel.hit_points.clone();
        let mut pending = duel.pending_actors.clone();
        for wizard in &wizards {
            points.init(wizard);
            hit_points.init(wizard);
            pending.insert(wizard.clone());
        }

        let mut roster = duel.wizards.clone();
        roster.extend(wizards);
        let mut players = duel.players.clone();
        players.push(player.clone());

        let changes = DuelChanges::new()
            .roster(roster, players)
            .scores(points, hit_points)
            .pending_actors(pending);
        let updated = duels::update_duel(txn, &duel, changes).await?;

        info!(duel_id, player = %player, wizards = updated.wizards.len(), "Player joined duel");
        Ok(updated)
    }

    /// Accept a start request. The duel stays WAITING_FOR_PLAYERS until the
    /// introduction job has recorded round 0 and opened round 1; calling this
    /// again before then re-schedules that job.
    pub async fn start_duel(
        &self,
        txn: &DatabaseTransaction,
        duel_id: i64,
    ) -> Result<FlowOutput<Duel>, DomainError> {
        let duel = duels::require_duel(txn, duel_id).await?;

        if duel.status != DuelStatus::WaitingForPlayers {
            return Err(DomainError::invalid_state(format!(
                "Duel {duel_id} cannot be started from {:?}",
                duel.status
            )));
        }
        if duel.wizards.len() < 2 {
            return Err(DomainError::invalid_state(format!(
                "Duel {duel_id} needs at least two wizards to start"
            )));
        }

        let duel = if duel.started_at.is_none() {
            let now = time::OffsetDateTime::now_utc();
            duels::update_duel(txn, &duel, DuelChanges::new().started_at(now)).await?
        } else {
            info!(duel_id, "Start requested again; re-scheduling introduction");
            duel
        };

        Ok(FlowOutput::new(duel).with_job(Job::IntroduceDuel { duel_id }))
    }

    /// Record the introduction as round 0 (if not already recorded) and open
    /// round 1, moving the duel IN_PROGRESS. Safe to repeat.
    pub async fn complete_introduction(
        &self,
        txn: &DatabaseTransaction,
        duel_id: i64,
        outcome: Option<RoundOutcome>,
    ) -> Result<FlowOutput<Duel>, DomainError> {
        let duel = duels::require_duel(txn, duel_id).await?;
        let mut jobs = Vec::new();

        if rounds::find_by_duel_and_number(txn, duel_id, INTRODUCTION_ROUND)
            .await?
            .is_none()
        {
            let outcome = outcome.ok_or_else(|| {
                DomainError::invalid_state(format!(
                    "Duel {duel_id} has no introduction to record"
                ))
            })?;
            rounds::create_round(
                txn,
                duel_id,
                INTRODUCTION_ROUND,
                crate::domain::RoundKind::SpellCasting,
                RoundStatus::Completed,
                Some(&outcome),
            )
            .await?;
            if outcome.prompt().is_some() {
                jobs.push(Job::IllustrateRound {
                    duel_id,
                    round_number: INTRODUCTION_ROUND,
                });
            }
            debug!(duel_id, "Introduction recorded");
        }

        if duel.status != DuelStatus::WaitingForPlayers {
            if duel.status == DuelStatus::Cancelled {
                warn!(duel_id, "Duel cancelled before introduction finished");
            }
            return Ok(FlowOutput {
                value: duel,
                jobs,
                wizard_results: Vec::new(),
            });
        }

        let kind = kind_for_round(duel.round_limit, FIRST_ROUND);
        rounds::create_round(
            txn,
            duel_id,
            FIRST_ROUND,
            kind,
            RoundStatus::WaitingForSpells,
            None,
        )
        .await?;

        let pending = duel.wizards.iter().cloned().collect();
        let changes = DuelChanges::new()
            .status(DuelStatus::InProgress)
            .current_round(FIRST_ROUND)
            .pending_actors(pending);
        let duel = duels::update_duel(txn, &duel, changes).await?;

        info!(duel_id, "Duel in progress; round 1 open");
        Ok(FlowOutput {
            value: duel,
            jobs,
            wizard_results: Vec::new(),
        })
    }

    /// Cancel any duel that has not completed.
    pub async fn cancel_duel(
        &self,
        txn: &DatabaseTransaction,
        duel_id: i64,
    ) -> Result<Duel, DomainError> {
        let duel = duels::require_duel(txn, duel_id).await?;

        match duel.status {
            DuelStatus::Completed => Err(DomainError::already_terminal(format!(
                "Duel {duel_id} has already completed"
            ))),
            DuelStatus::Cancelled => Ok(duel),
            DuelStatus::WaitingForPlayers | DuelStatus::InProgress => {
                let changes = DuelChanges::new()
                    .status(DuelStatus::Cancelled)
                    .ended_at(time::OffsetDateTime::now_utc());
                let duel = duels::update_duel(txn, &duel, changes).await?;
                info!(duel_id, "Duel cancelled");
                Ok(duel)
            }
        }
    }

    pub(super) fn require_member(duel: &Duel, wizard: &WizardId) -> Result<(), DomainError> {
        if duel.has_wizard(wizard) {
            Ok(())
        } else {
            Err(DomainError::not_found(
                NotFoundKind::Wizard,
                format!("Wizard {wizard} is not part of duel {}", duel.id),
            ))
        }
    }
}
