//! Domain layer: pure duel types and rules, no I/O.

pub mod end_condition;
pub mod ids;
pub mod outcome;
pub mod round_limit;
pub mod scores;

#[cfg(test)]
mod test_prelude;
#[cfg(test)]
mod tests_end_condition;
#[cfg(test)]
mod tests_props_end_condition;

pub use end_condition::{evaluate, EndDecision, EndReason, Standings};
pub use ids::{ImageRef, PlayerId, UserId, WizardId};
pub use outcome::{RoundOutcome, SpellEntry, Spells};
pub use round_limit::RoundLimit;
pub use scores::{HitPoints, Points};

pub use crate::entities::duel_rounds::{RoundKind, RoundStatus};
pub use crate::entities::duels::DuelStatus;
