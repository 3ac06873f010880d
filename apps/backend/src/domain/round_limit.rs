use serde::{Deserialize, Serialize};

/// How long a duel lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "rounds", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundLimit {
    /// Ends after this many rounds unless a wizard is eliminated first.
    FixedRounds(u32),
    /// Ends only by elimination.
    ToTheDeath,
}

impl RoundLimit {
    /// Column representation: `NULL` encodes `ToTheDeath`.
    pub fn to_max_rounds(self) -> Option<i32> {
        match self {
            RoundLimit::FixedRounds(n) => Some(i32::try_from(n).unwrap_or(i32::MAX)),
            RoundLimit::ToTheDeath => None,
        }
    }

    pub fn from_max_rounds(max_rounds: Option<i32>) -> Self {
        match max_rounds {
            Some(n) => RoundLimit::FixedRounds(u32::try_from(n).unwrap_or(0)),
            None => RoundLimit::ToTheDeath,
        }
    }

    /// True once `round_number` has reached the final scheduled round.
    pub fn is_final_round(self, round_number: u32) -> bool {
        match self {
            RoundLimit::FixedRounds(n) => round_number >= n,
            RoundLimit::ToTheDeath => false,
        }
    }
}
