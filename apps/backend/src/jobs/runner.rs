//! Job handler backed by the duel engine and its collaborators.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Job, JobHandler, RecordingScheduler};
use crate::collaborators::{
    ConclusionContext, IntroductionContext, RoundContext, RoundSummary,
};
use crate::domain::{RoundKind, RoundStatus};
use crate::errors::domain::DomainError;
use crate::repos::{duels, rounds, Round};
use crate::services::DuelEngine;

#[derive(Clone)]
pub struct JobRunner {
    engine: DuelEngine,
}

impl JobRunner {
    pub fn new(engine: DuelEngine) -> Self {
        Self { engine }
    }

    /// Run everything `scheduler` has collected, including jobs scheduled by
    /// the jobs themselves, until nothing is left. Returns the number run.
    pub async fn run_pending(&self, scheduler: &RecordingScheduler) -> Result<usize, DomainError> {
        let mut ran = 0;
        loop {
            let jobs = scheduler.drain();
            if jobs.is_empty() {
                return Ok(ran);
            }
            for job in jobs {
                self.handle(&job).await?;
                ran += 1;
            }
        }
    }

    async fn introduce(&self, duel_id: i64) -> Result<(), DomainError> {
        let db = self.engine.db();
        let duel = duels::require_duel(db, duel_id).await?;

        if rounds::find_by_duel_and_number(db, duel_id, 0).await?.is_some() {
            debug!(duel_id, "Introduction already narrated");
            self.engine.complete_introduction(duel_id, None).await?;
            return Ok(());
        }
        if duel.status.is_terminal() {
            debug!(duel_id, status = ?duel.status, "Duel over; skipping introduction");
            return Ok(());
        }

        let collaborators = self.engine.collaborators();
        let ctx = IntroductionContext {
            duel_id,
            wizards: collaborators.profiles(&duel.wizards).await,
        };
        let outcome = collaborators.narrator.introduce(ctx).await?;
        self.engine.complete_introduction(duel_id, Some(outcome)).await?;
        info!(duel_id, "Duel introduced");
        Ok(())
    }

    async fn narrate(&self, round_id: i64) -> Result<(), DomainError> {
        let db = self.engine.db();
        let round = rounds::require_round(db, round_id).await?;
        if round.status != RoundStatus::Processing {
            debug!(round_id, status = ?round.status, "Round not processing; nothing to narrate");
            return Ok(());
        }

        let duel = duels::require_duel(db, round.duel_id).await?;
        let earlier = rounds::list_for_duel(db, duel.id).await?;
        let history = history_before(&earlier, round.round_number);
        let collaborators = self.engine.collaborators();
        let wizards = collaborators.profiles(&duel.wizards).await;

        let outcome = if round.kind == RoundKind::Conclusion {
            let ctx = ConclusionContext {
                duel_id: duel.id,
                wizards,
                winners: duel.winners.clone().unwrap_or_default(),
                losers: duel.losers.clone().unwrap_or_default(),
                history,
            };
            collaborators.narrator.conclude(ctx).await?
        } else {
            let ctx = RoundContext {
                duel_id: duel.id,
                round_number: round.round_number,
                kind: round.kind,
                spells: round.spells.clone(),
                wizards,
                points: duel.points.clone(),
                hit_points: duel.hit_points.clone(),
                history,
            };
            collaborators.narrator.resolve_round(ctx).await?
        };

        self.engine.apply_outcome(round_id, outcome).await?;
        Ok(())
    }
}

/// Narratives of completed rounds before `round_number`, oldest first.
fn history_before(rounds: &[Round], round_number: u32) -> Vec<RoundSummary> {
    rounds
        .iter()
        .filter(|r| r.status == RoundStatus::Completed && r.round_number < round_number)
        .filter_map(|r| {
            let outcome = r.outcome.as_ref()?;
            Some(RoundSummary {
                round_number: r.round_number,
                narrative: outcome.narrative.clone(),
                result_summary: outcome.result_summary.clone(),
            })
        })
        .collect()
}

#[async_trait]
impl JobHandler for JobRunner {
    async fn handle(&self, job: &Job) -> Result<(), DomainError> {
        match job {
            Job::IntroduceDuel { duel_id } => self.introduce(*duel_id).await,
            Job::NarrateRound { round_id } => self.narrate(*round_id).await,
            Job::IllustrateRound {
                duel_id,
                round_number,
            } => {
                let result = self.engine.illustrate_round(*duel_id, *round_number).await?;
                debug!(
                    duel_id,
                    round_number,
                    text_only = result.text_only_mode,
                    reason = ?result.reason,
                    "Illustration job finished"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::{RoundOutcome, Spells};

    fn round(number: u32, status: RoundStatus, narrative: Option<&str>) -> Round {
        Round {
            id: i64::from(number) + 10,
            duel_id: 1,
            round_number: number,
            kind: RoundKind::SpellCasting,
            status,
            spells: Spells::new(),
            outcome: narrative.map(RoundOutcome::narrative),
            created_at: OffsetDateTime::UNIX_EPOCH,
            completed_at: None,
        }
    }

    #[test]
    fn history_keeps_completed_rounds_before_current() {
        let all = vec![
            round(0, RoundStatus::Completed, Some("intro")),
            round(1, RoundStatus::Completed, Some("first")),
            round(2, RoundStatus::Processing, None),
        ];
        let history = history_before(&all, 2);
        let narratives: Vec<_> = history.iter().map(|h| h.narrative.as_str()).collect();
        assert_eq!(narratives, vec!["intro", "first"]);
    }
}
