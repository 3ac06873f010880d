//! Ports to the external systems the duel engine depends on.
//!
//! Every port is an object-safe `async_trait` so the engine can hold
//! `Arc<dyn ...>` handles and tests can substitute fakes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    HitPoints, ImageRef, Points, RoundKind, RoundOutcome, Spells, UserId, WizardId,
};
use crate::errors::domain::{DomainError, InfraErrorKind};

pub mod http;
pub mod memory;
pub mod processing;

pub use processing::{ImageProcessor, PassthroughProcessor, ProcessedImage, ResizeJpegProcessor};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("invalid collaborator response: {0}")]
    InvalidResponse(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("collaborator disabled: {0}")]
    Disabled(&'static str),
}

impl From<CollaboratorError> for DomainError {
    fn from(err: CollaboratorError) -> Self {
        DomainError::infra(InfraErrorKind::Collaborator, err.to_string())
    }
}

/// Descriptive data about a wizard, owned by the wizard registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardProfile {
    pub id: WizardId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub illustration: Option<ImageRef>,
}

impl WizardProfile {
    /// Profile used when the registry has no entry for a wizard.
    pub fn anonymous(id: &WizardId) -> Self {
        Self {
            id: id.clone(),
            name: id.to_string(),
            description: String::new(),
            illustration: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub round_number: u32,
    pub narrative: String,
    #[serde(default)]
    pub result_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntroductionContext {
    pub duel_id: i64,
    pub wizards: Vec<WizardProfile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundContext {
    pub duel_id: i64,
    pub round_number: u32,
    pub kind: RoundKind,
    pub spells: Spells,
    pub wizards: Vec<WizardProfile>,
    pub points: Points,
    pub hit_points: HitPoints,
    pub history: Vec<RoundSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConclusionContext {
    pub duel_id: i64,
    pub wizards: Vec<WizardProfile>,
    pub winners: Vec<WizardId>,
    pub losers: Vec<WizardId>,
    pub history: Vec<RoundSummary>,
}

/// Turns submitted spells into structured outcomes.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn introduce(&self, ctx: IntroductionContext) -> Result<RoundOutcome, CollaboratorError>;
    async fn resolve_round(&self, ctx: RoundContext) -> Result<RoundOutcome, CollaboratorError>;
    async fn conclude(&self, ctx: ConclusionContext) -> Result<RoundOutcome, CollaboratorError>;
}

/// Which image synthesis backend renders an illustration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageBackend {
    /// Backend A: renders from the prompt alone.
    PromptOnly,
    /// Backend B: also receives reference images and wizard descriptions.
    #[default]
    ContextAware,
}

impl std::str::FromStr for ImageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prompt_only" | "a" => Ok(ImageBackend::PromptOnly),
            "context_aware" | "b" => Ok(ImageBackend::ContextAware),
            other => Err(format!("unknown image backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub image_ref: ImageRef,
    pub bytes: Vec<u8>,
}

/// Extra inputs for context-aware generation. Empty for prompt-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationContext {
    pub reference_images: Vec<ReferenceImage>,
    pub wizard_descriptions: Vec<String>,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        ctx: GenerationContext,
    ) -> Result<Vec<u8>, CollaboratorError>;
}

#[derive(Clone)]
pub struct ImageBackends {
    pub prompt_only: Arc<dyn ImageGenerator>,
    pub context_aware: Arc<dyn ImageGenerator>,
}

impl ImageBackends {
    pub fn select(&self, backend: ImageBackend) -> &Arc<dyn ImageGenerator> {
        match backend {
            ImageBackend::PromptOnly => &self.prompt_only,
            ImageBackend::ContextAware => &self.context_aware,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditMetadata {
    pub round_number: u32,
    pub backend: ImageBackend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditConsumption {
    pub success: bool,
    pub already_consumed: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Per-user image credits. At most one net debit per duel is the ledger's
/// own guarantee.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    async fn consume_image_credit_for_duel(
        &self,
        user_id: &UserId,
        duel_id: i64,
        metadata: CreditMetadata,
    ) -> Result<CreditConsumption, CollaboratorError>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<ImageRef, CollaboratorError>;
    async fn fetch(&self, image_ref: &ImageRef) -> Result<Vec<u8>, CollaboratorError>;
}

#[async_trait]
pub trait WizardRegistry: Send + Sync {
    async fn profile(&self, wizard_id: &WizardId) -> Result<WizardProfile, CollaboratorError>;
    async fn record_wizard_result(
        &self,
        wizard_id: &WizardId,
        won: bool,
        is_campaign: bool,
    ) -> Result<(), CollaboratorError>;
}

/// Handles to every collaborator the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub narrator: Arc<dyn Narrator>,
    pub images: ImageBackends,
    pub credits: Arc<dyn CreditLedger>,
    pub storage: Arc<dyn ObjectStorage>,
    pub wizards: Arc<dyn WizardRegistry>,
    pub processor: Arc<dyn ImageProcessor>,
}

impl Collaborators {
    /// Profiles for `ids`, falling back to an anonymous profile when the
    /// registry cannot supply one.
    pub async fn profiles(&self, ids: &[WizardId]) -> Vec<WizardProfile> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match self.wizards.profile(id).await {
                Ok(profile) => out.push(profile),
                Err(err) => {
                    tracing::debug!(wizard_id = %id, error = %err, "wizard profile unavailable");
                    out.push(WizardProfile::anonymous(id));
                }
            }
        }
        out
    }
}
