//! DTOs for rounds_sea adapter.

use sea_orm::prelude::Json;

use crate::entities::duel_rounds::{RoundKind, RoundStatus};

#[derive(Debug, Clone)]
pub struct RoundCreate {
    pub duel_id: i64,
    pub round_number: i32,
    pub kind: RoundKind,
    pub status: RoundStatus,
    pub outcome: Option<Json>,
}

impl RoundCreate {
    /// A round open for spell submissions.
    pub fn open(duel_id: i64, round_number: i32, kind: RoundKind) -> Self {
        Self {
            duel_id,
            round_number,
            kind,
            status: RoundStatus::WaitingForSpells,
            outcome: None,
        }
    }

    pub fn with_status(mut self, status: RoundStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_outcome(mut self, outcome: Json) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

/// Conditional status transition: applied only while the round is still in
/// `from`.
#[derive(Debug, Clone)]
pub struct RoundTransition {
    pub round_id: i64,
    pub from: RoundStatus,
    pub to: RoundStatus,
    pub outcome: Option<Json>,
}

impl RoundTransition {
    pub fn new(round_id: i64, from: RoundStatus, to: RoundStatus) -> Self {
        Self {
            round_id,
            from,
            to,
            outcome: None,
        }
    }

    pub fn with_outcome(mut self, outcome: Json) -> Self {
        self.outcome = Some(outcome);
        self
    }
}
