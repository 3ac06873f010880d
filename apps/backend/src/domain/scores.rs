//! Per-wizard points and hit points with default-on-missing semantics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::ids::WizardId;

pub const STARTING_POINTS: i32 = 0;
pub const STARTING_HIT_POINTS: i32 = 100;
pub const MIN_HIT_POINTS: i32 = 0;
pub const MAX_HIT_POINTS: i32 = 100;

/// Accumulated points per wizard. Missing entries read as `STARTING_POINTS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Points(BTreeMap<WizardId, i32>);

impl Points {
    pub fn starting(wizards: &[WizardId]) -> Self {
        Self(
            wizards
                .iter()
                .map(|w| (w.clone(), STARTING_POINTS))
                .collect(),
        )
    }

    pub fn get(&self, wizard: &WizardId) -> i32 {
        self.0.get(wizard).copied().unwrap_or(STARTING_POINTS)
    }

    pub fn init(&mut self, wizard: &WizardId) {
        self.0.entry(wizard.clone()).or_insert(STARTING_POINTS);
    }

    /// Additive award; saturates rather than overflowing.
    pub fn award(&mut self, wizard: &WizardId, delta: i32) {
        let current = self.get(wizard);
        self.0.insert(wizard.clone(), current.saturating_add(delta));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WizardId, &i32)> {
        self.0.iter()
    }
}

/// Hit points per wizard, always within `[MIN_HIT_POINTS, MAX_HIT_POINTS]`.
/// Missing entries read as `STARTING_HIT_POINTS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HitPoints(BTreeMap<WizardId, i32>);

impl HitPoints {
    pub fn starting(wizards: &[WizardId]) -> Self {
        Self(
            wizards
                .iter()
                .map(|w| (w.clone(), STARTING_HIT_POINTS))
                .collect(),
        )
    }

    pub fn get(&self, wizard: &WizardId) -> i32 {
        self.0
            .get(wizard)
            .copied()
            .unwrap_or(STARTING_HIT_POINTS)
            .clamp(MIN_HIT_POINTS, MAX_HIT_POINTS)
    }

    pub fn init(&mut self, wizard: &WizardId) {
        self.0.entry(wizard.clone()).or_insert(STARTING_HIT_POINTS);
    }

    /// Additive change clamped to the valid range.
    pub fn apply_delta(&mut self, wizard: &WizardId, delta: i32) {
        let next = clamp_hit_points(self.get(wizard), delta);
        self.0.insert(wizard.clone(), next);
    }

    pub fn is_alive(&self, wizard: &WizardId) -> bool {
        self.get(wizard) > MIN_HIT_POINTS
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WizardId, &i32)> {
        self.0.iter()
    }
}

/// `current + delta`, clamped to `[MIN_HIT_POINTS, MAX_HIT_POINTS]`.
pub fn clamp_hit_points(current: i32, delta: i32) -> i32 {
    current
        .saturating_add(delta)
        .clamp(MIN_HIT_POINTS, MAX_HIT_POINTS)
}
