//! Structured results produced by the narrator and applied to duel state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::ids::{ImageRef, WizardId};

/// One submitted action. Resubmission overwrites the previous entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellEntry {
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

pub type Spells = BTreeMap<WizardId, SpellEntry>;

/// Resolution of a round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    pub narrative: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustration_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustration_ref: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_awarded: Option<BTreeMap<WizardId, i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_delta: Option<BTreeMap<WizardId, i32>>,
}

impl RoundOutcome {
    pub fn narrative(text: impl Into<String>) -> Self {
        Self {
            narrative: text.into(),
            ..Self::default()
        }
    }

    pub fn with_points(mut self, wizard: impl Into<WizardId>, points: i32) -> Self {
        self.points_awarded
            .get_or_insert_with(BTreeMap::new)
            .insert(wizard.into(), points);
        self
    }

    pub fn with_health(mut self, wizard: impl Into<WizardId>, delta: i32) -> Self {
        self.health_delta
            .get_or_insert_with(BTreeMap::new)
            .insert(wizard.into(), delta);
        self
    }

    pub fn with_illustration_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.illustration_prompt = Some(prompt.into());
        self
    }

    /// The prompt to illustrate, if any non-blank one was supplied.
    pub fn prompt(&self) -> Option<&str> {
        self.illustration_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_with_optional_fields_missing() {
        let outcome: RoundOutcome = serde_json::from_value(serde_json::json!({
            "narrative": "Sparks fly.",
            "healthDelta": {"morgana": -20}
        }))
        .unwrap();

        assert_eq!(outcome.narrative, "Sparks fly.");
        assert!(outcome.points_awarded.is_none());
        assert_eq!(
            outcome.health_delta.unwrap().get(&WizardId::from("morgana")),
            Some(&-20)
        );
    }

    #[test]
    fn blank_prompt_is_treated_as_absent() {
        let outcome = RoundOutcome::narrative("x").with_illustration_prompt("   ");
        assert_eq!(outcome.prompt(), None);
    }
}
