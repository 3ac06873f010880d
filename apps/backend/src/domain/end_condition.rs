//! Decides whether a duel terminates after a round outcome has been applied.
//!
//! Pure and deterministic: the same standings always produce the same decision,
//! and winners/losers are reported in wizard order.

use crate::domain::ids::WizardId;
use crate::domain::round_limit::RoundLimit;
use crate::domain::scores::{HitPoints, Points};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// At most one wizard is left standing.
    Elimination,
    /// The final scheduled round has been played.
    RoundLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndDecision {
    Continue,
    End {
        reason: EndReason,
        winners: Vec<WizardId>,
        losers: Vec<WizardId>,
    },
}

impl EndDecision {
    pub fn should_end(&self) -> bool {
        matches!(self, EndDecision::End { .. })
    }
}

/// Standings a decision is computed from.
#[derive(Debug, Clone, Copy)]
pub struct Standings<'a> {
    pub wizards: &'a [WizardId],
    pub points: &'a Points,
    pub hit_points: &'a HitPoints,
}

pub fn evaluate(standings: Standings<'_>, limit: RoundLimit, current_round: u32) -> EndDecision {
    let Standings {
        wizards,
        points,
        hit_points,
    } = standings;

    let (alive, fallen): (Vec<WizardId>, Vec<WizardId>) = wizards
        .iter()
        .cloned()
        .partition(|w| hit_points.is_alive(w));

    if alive.len() <= 1 {
        return EndDecision::End {
            reason: EndReason::Elimination,
            winners: alive,
            losers: fallen,
        };
    }

    if !limit.is_final_round(current_round) {
        return EndDecision::Continue;
    }

    let rank = |w: &WizardId| (points.get(w), hit_points.get(w));
    let Some(best) = wizards.iter().map(rank).max() else {
        return EndDecision::Continue;
    };

    let (winners, losers) = wizards.iter().cloned().partition(|w| rank(w) == best);
    EndDecision::End {
        reason: EndReason::RoundLimit,
        winners,
        losers,
    }
}
