//! Illustration pipeline: credit check, generation, processing, storage.
//!
//! Visual content is optional relative to narrative, so nothing here returns
//! an error. Every failure degrades to a successful text-only result carrying
//! a reason code.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collaborators::processing::sniff_content_type;
use crate::collaborators::{
    Collaborators, CreditMetadata, GenerationContext, ImageBackend, ProcessedImage,
    ReferenceImage,
};
use crate::db::with_txn;
use crate::domain::{ImageRef, RoundStatus, UserId};
use crate::errors::domain::DomainError;
use crate::repos::{duels, rounds, Round};
use crate::services::duel_flow::DuelFlowService;

#[derive(Debug, Clone)]
pub struct IllustrationRequest {
    pub prompt: String,
    pub duel_id: i64,
    pub round_number: u32,
    pub backend: ImageBackend,
    pub user_id: Option<UserId>,
    pub skip_image_generation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOnlyReason {
    InsufficientCredits,
    ImageGenerationFailed,
}

impl TextOnlyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TextOnlyReason::InsufficientCredits => "insufficient_credits",
            TextOnlyReason::ImageGenerationFailed => "image_generation_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IllustrationResult {
    pub success: bool,
    pub text_only_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_ref: Option<ImageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<TextOnlyReason>,
}

impl IllustrationResult {
    pub(crate) fn stored(image_ref: ImageRef) -> Self {
        Self {
            success: true,
            text_only_mode: false,
            storage_ref: Some(image_ref),
            reason: None,
        }
    }

    pub(crate) fn text_only(reason: Option<TextOnlyReason>) -> Self {
        Self {
            success: true,
            text_only_mode: true,
            storage_ref: None,
            reason,
        }
    }
}

pub async fn generate_round_illustration(
    db: &DatabaseConnection,
    collaborators: &Collaborators,
    request: IllustrationRequest,
) -> IllustrationResult {
    let duel_id = request.duel_id;
    let round_number = request.round_number;

    if request.skip_image_generation {
        debug!(duel_id, round_number, "Image generation skipped");
        return IllustrationResult::text_only(None);
    }

    if let Some(user_id) = &request.user_id {
        let metadata = CreditMetadata {
            round_number,
            backend: request.backend,
        };
        match collaborators
            .credits
            .consume_image_credit_for_duel(user_id, duel_id, metadata)
            .await
        {
            Ok(consumption) if consumption.success => {
                debug!(duel_id, already_consumed = consumption.already_consumed, "Image credit ok");
            }
            Ok(consumption) => {
                info!(duel_id, user_id = %user_id, reason = ?consumption.reason, "No image credit; text-only");
                return IllustrationResult::text_only(Some(TextOnlyReason::InsufficientCredits));
            }
            Err(err) => {
                warn!(duel_id, error = %err, "Credit ledger failed; text-only");
                return IllustrationResult::text_only(Some(TextOnlyReason::ImageGenerationFailed));
            }
        }
    }

    match render_and_store(db, collaborators, &request).await {
        Ok(image_ref) => {
            info!(duel_id, round_number, image_ref = %image_ref, "Round illustrated");
            IllustrationResult::stored(image_ref)
        }
        Err(err) => {
            warn!(duel_id, round_number, error = %err, "Illustration failed; text-only");
            IllustrationResult::text_only(Some(TextOnlyReason::ImageGenerationFailed))
        }
    }
}

async fn render_and_store(
    db: &DatabaseConnection,
    collaborators: &Collaborators,
    request: &IllustrationRequest,
) -> Result<ImageRef, DomainError> {
    let ctx = match request.backend {
        ImageBackend::PromptOnly => GenerationContext::default(),
        ImageBackend::ContextAware => generation_context(db, collaborators, request).await?,
    };

    let raw = collaborators
        .images
        .select(request.backend)
        .generate(&request.prompt, ctx)
        .await?;
    let processed = process_or_fallback(collaborators, raw).await;

    let image_ref = collaborators
        .storage
        .store(processed.bytes, processed.content_type)
        .await?;

    let duel_id = request.duel_id;
    let round_number = request.round_number;
    let stored = image_ref.clone();
    with_txn(db, move |txn| {
        Box::pin(async move {
            let flow = DuelFlowService::default();
            let round = rounds::find_by_duel_and_number(txn, duel_id, round_number)
                .await?
                .ok_or_else(|| {
                    DomainError::round_not_found(format!(
                        "Round {round_number} of duel {duel_id} not found"
                    ))
                })?;
            flow.update_round_illustration(txn, round.id, &stored).await?;
            if round_number == 0 {
                flow.update_featured_illustration(txn, duel_id, &stored).await?;
            }
            Ok(())
        })
    })
    .await?;

    Ok(image_ref)
}

/// Reference material for the context-aware backend: every wizard's portrait
/// for the introduction, otherwise the latest earlier illustration plus the
/// wizards' descriptions.
async fn generation_context(
    db: &DatabaseConnection,
    collaborators: &Collaborators,
    request: &IllustrationRequest,
) -> Result<GenerationContext, DomainError> {
    let duel = duels::require_duel(db, request.duel_id).await?;
    let profiles = collaborators.profiles(&duel.wizards).await;

    if request.round_number == 0 {
        let mut reference_images = Vec::new();
        for image_ref in profiles.iter().filter_map(|p| p.illustration.as_ref()) {
            match collaborators.storage.fetch(image_ref).await {
                Ok(bytes) => reference_images.push(ReferenceImage {
                    image_ref: image_ref.clone(),
                    bytes,
                }),
                Err(err) => debug!(image_ref = %image_ref, error = %err, "Wizard portrait unavailable"),
            }
        }
        return Ok(GenerationContext {
            reference_images,
            wizard_descriptions: Vec::new(),
        });
    }

    let history = rounds::list_for_duel(db, request.duel_id).await?;
    let mut reference_images = Vec::new();
    if let Some(image_ref) = latest_prior_illustration(&history, request.round_number) {
        reference_images.push(ReferenceImage {
            bytes: collaborators.storage.fetch(image_ref).await?,
            image_ref: image_ref.clone(),
        });
    }

    Ok(GenerationContext {
        reference_images,
        wizard_descriptions: profiles
            .iter()
            .map(|p| format!("{}: {}", p.name, p.description))
            .collect(),
    })
}

/// Highest-numbered completed round before `current` that has an illustration.
pub fn latest_prior_illustration(rounds: &[Round], current: u32) -> Option<&ImageRef> {
    rounds
        .iter()
        .filter(|r| r.status == RoundStatus::Completed && r.round_number < current)
        .filter_map(|r| r.illustration().map(|img| (r.round_number, img)))
        .max_by_key(|(n, _)| *n)
        .map(|(_, img)| img)
}

async fn process_or_fallback(collaborators: &Collaborators, raw: Vec<u8>) -> ProcessedImage {
    let processor = Arc::clone(&collaborators.processor);
    let input = raw.clone();
    match tokio::task::spawn_blocking(move || processor.process(&input)).await {
        Ok(Ok(processed)) => processed,
        Ok(Err(err)) => {
            warn!(error = %err, "Image processing failed; storing original bytes");
            ProcessedImage {
                content_type: sniff_content_type(&raw),
                bytes: raw,
            }
        }
        Err(err) => {
            warn!(error = %err, "Image processing task failed; storing original bytes");
            ProcessedImage {
                content_type: sniff_content_type(&raw),
                bytes: raw,
            }
        }
    }
}
