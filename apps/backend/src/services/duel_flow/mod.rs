//! Duel flow service - duel and round state transitions on top of the repos.
//!
//! Every method runs inside a caller-owned transaction and never talks to a
//! collaborator. Follow-up work comes back as [`Job`]s for the caller to
//! schedule once the transaction has committed.

mod artwork;
mod finalizer;
mod lifecycle;
mod reads;
mod spells;

use crate::domain::{PlayerId, RoundKind, RoundLimit, UserId, WizardId};
use crate::jobs::Job;

pub use reads::DuelView;

/// Duel flow service. Stateless apart from the conclusion toggle.
#[derive(Debug, Clone, Copy)]
pub struct DuelFlowService {
    narrate_conclusion: bool,
}

impl Default for DuelFlowService {
    fn default() -> Self {
        Self {
            narrate_conclusion: true,
        }
    }
}

impl DuelFlowService {
    pub fn new(narrate_conclusion: bool) -> Self {
        Self { narrate_conclusion }
    }
}

#[derive(Debug, Clone)]
pub struct CreateDuel {
    pub round_limit: RoundLimit,
    pub wizards: Vec<WizardId>,
    pub players: Vec<PlayerId>,
    pub created_by: Option<UserId>,
    pub is_campaign: bool,
}

/// Final standing for one wizard, reported to the wizard registry after commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardResult {
    pub wizard_id: WizardId,
    pub won: bool,
    pub is_campaign: bool,
}

/// Result of a transition plus the side effects it requested.
#[derive(Debug, Clone)]
pub struct FlowOutput<T> {
    pub value: T,
    pub jobs: Vec<Job>,
    pub wizard_results: Vec<WizardResult>,
}

impl<T> FlowOutput<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            jobs: Vec::new(),
            wizard_results: Vec::new(),
        }
    }

    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }
}

/// Kind of a regular round: FINAL_ROUND when it is the last one the limit allows.
pub fn kind_for_round(limit: RoundLimit, round_number: u32) -> RoundKind {
    if limit.is_final_round(round_number) {
        RoundKind::FinalRound
    } else {
        RoundKind::SpellCasting
    }
}
