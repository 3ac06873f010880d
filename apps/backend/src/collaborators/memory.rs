//! In-process collaborator implementations for local development and tests.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::{
    CollaboratorError, ConclusionContext, CreditConsumption, CreditLedger, CreditMetadata,
    GenerationContext, ImageGenerator, IntroductionContext, Narrator, ObjectStorage,
    RoundContext, WizardProfile, WizardRegistry,
};
use crate::domain::{ImageRef, RoundOutcome, UserId, WizardId};

pub const INSUFFICIENT_CREDITS: &str = "insufficient_credits";

/// Credit balances keyed by user. A duel is debited at most once.
#[derive(Debug, Default)]
pub struct InMemoryCreditLedger {
    balances: DashMap<UserId, u32>,
    consumed: Mutex<HashSet<(UserId, i64)>>,
}

impl InMemoryCreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, user: impl Into<UserId>, credits: u32) -> Self {
        self.balances.insert(user.into(), credits);
        self
    }

    pub fn balance(&self, user: &UserId) -> u32 {
        self.balances.get(user).map(|b| *b).unwrap_or(0)
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn consume_image_credit_for_duel(
        &self,
        user_id: &UserId,
        duel_id: i64,
        _metadata: CreditMetadata,
    ) -> Result<CreditConsumption, CollaboratorError> {
        let mut consumed = self.consumed.lock();
        let key = (user_id.clone(), duel_id);
        if consumed.contains(&key) {
            return Ok(CreditConsumption {
                success: true,
                already_consumed: true,
                reason: None,
            });
        }

        let mut balance = self.balances.entry(user_id.clone()).or_insert(0);
        if *balance == 0 {
            return Ok(CreditConsumption {
                success: false,
                already_consumed: false,
                reason: Some(INSUFFICIENT_CREDITS.to_string()),
            });
        }
        *balance -= 1;
        consumed.insert(key);

        Ok(CreditConsumption {
            success: true,
            already_consumed: false,
            reason: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    objects: DashMap<ImageRef, (String, Vec<u8>)>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn content_type(&self, image_ref: &ImageRef) -> Option<String> {
        self.objects.get(image_ref).map(|o| o.0.clone())
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<ImageRef, CollaboratorError> {
        let image_ref = ImageRef::new(format!("img_{}", uuid::Uuid::new_v4().simple()));
        self.objects
            .insert(image_ref.clone(), (content_type.to_string(), bytes));
        Ok(image_ref)
    }

    async fn fetch(&self, image_ref: &ImageRef) -> Result<Vec<u8>, CollaboratorError> {
        self.objects
            .get(image_ref)
            .map(|o| o.1.clone())
            .ok_or_else(|| CollaboratorError::NotFound(image_ref.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WizardRecord {
    pub wins: u32,
    pub losses: u32,
    pub campaign_results: u32,
}

#[derive(Debug, Default)]
pub struct InMemoryWizardRegistry {
    profiles: DashMap<WizardId, WizardProfile>,
    records: DashMap<WizardId, WizardRecord>,
}

impl InMemoryWizardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, profile: WizardProfile) -> Self {
        self.insert_profile(profile);
        self
    }

    pub fn insert_profile(&self, profile: WizardProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn record(&self, wizard_id: &WizardId) -> WizardRecord {
        self.records
            .get(wizard_id)
            .map(|r| *r)
            .unwrap_or_default()
    }
}

#[async_trait]
impl WizardRegistry for InMemoryWizardRegistry {
    async fn profile(&self, wizard_id: &WizardId) -> Result<WizardProfile, CollaboratorError> {
        Ok(self
            .profiles
            .get(wizard_id)
            .map(|p| p.clone())
            .unwrap_or_else(|| WizardProfile::anonymous(wizard_id)))
    }

    async fn record_wizard_result(
        &self,
        wizard_id: &WizardId,
        won: bool,
        is_campaign: bool,
    ) -> Result<(), CollaboratorError> {
        let mut record = self.records.entry(wizard_id.clone()).or_default();
        if is_campaign {
            record.campaign_results += 1;
        } else if won {
            record.wins += 1;
        } else {
            record.losses += 1;
        }
        Ok(())
    }
}

/// Deterministic narrator for local runs without a narration service:
/// every caster scores a point and deals ten damage to each other wizard.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoNarrator;

const ECHO_DAMAGE: i32 = 10;

#[async_trait]
impl Narrator for EchoNarrator {
    async fn introduce(&self, ctx: IntroductionContext) -> Result<RoundOutcome, CollaboratorError> {
        let names: Vec<&str> = ctx.wizards.iter().map(|w| w.name.as_str()).collect();
        Ok(RoundOutcome::narrative(format!(
            "The duel begins: {}.",
            names.join(" versus ")
        )))
    }

    async fn resolve_round(&self, ctx: RoundContext) -> Result<RoundOutcome, CollaboratorError> {
        let mut outcome = RoundOutcome::narrative(
            ctx.spells
                .iter()
                .map(|(wizard, spell)| format!("{wizard} casts \"{}\".", spell.text))
                .collect::<Vec<_>>()
                .join(" "),
        );
        for caster in ctx.spells.keys() {
            outcome = outcome.with_points(caster.clone(), 1);
        }
        for target in &ctx.wizards {
            let hits = ctx.spells.keys().filter(|c| **c != target.id).count();
            let damage = i32::try_from(hits).unwrap_or(i32::MAX / ECHO_DAMAGE) * ECHO_DAMAGE;
            if damage > 0 {
                outcome = outcome.with_health(target.id.clone(), -damage);
            }
        }
        Ok(outcome)
    }

    async fn conclude(&self, ctx: ConclusionContext) -> Result<RoundOutcome, CollaboratorError> {
        let winners: Vec<String> = ctx.winners.iter().map(ToString::to_string).collect();
        let text = if winners.is_empty() {
            "No wizard is left standing.".to_string()
        } else {
            format!("Victory to {}.", winners.join(" and "))
        };
        Ok(RoundOutcome::narrative(text))
    }
}

/// Image backend that always refuses; rounds fall back to text-only mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledImageGenerator;

#[async_trait]
impl ImageGenerator for DisabledImageGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _ctx: GenerationContext,
    ) -> Result<Vec<u8>, CollaboratorError> {
        Err(CollaboratorError::Disabled("image generation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ImageBackend;

    fn meta() -> CreditMetadata {
        CreditMetadata {
            round_number: 1,
            backend: ImageBackend::PromptOnly,
        }
    }

    #[tokio::test]
    async fn ledger_debits_once_per_duel() {
        let ledger = InMemoryCreditLedger::new().with_balance("u1", 2);
        let user = UserId::from("u1");

        let first = ledger.consume_image_credit_for_duel(&user, 9, meta()).await.unwrap();
        let second = ledger.consume_image_credit_for_duel(&user, 9, meta()).await.unwrap();

        assert!(first.success && !first.already_consumed);
        assert!(second.success && second.already_consumed);
        assert_eq!(ledger.balance(&user), 1);
    }

    #[tokio::test]
    async fn ledger_reports_insufficient_credits() {
        let ledger = InMemoryCreditLedger::new();
        let result = ledger
            .consume_image_credit_for_duel(&UserId::from("broke"), 1, meta())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.reason.as_deref(), Some(INSUFFICIENT_CREDITS));
    }

    #[tokio::test]
    async fn storage_round_trips_bytes() {
        let storage = InMemoryObjectStorage::new();
        let image_ref = storage.store(vec![1, 2, 3], "image/png").await.unwrap();
        assert_eq!(storage.fetch(&image_ref).await.unwrap(), vec![1, 2, 3]);
        assert!(storage.fetch(&ImageRef::from("missing")).await.is_err());
    }
}
