//! In-memory SQLite engine with recorded jobs and fake collaborators.

use std::sync::Arc;

use db_infra::DbKind;
use duel_backend::collaborators::memory::{
    InMemoryCreditLedger, InMemoryObjectStorage, InMemoryWizardRegistry,
};
use duel_backend::collaborators::{
    Collaborators, ImageBackends, ImageProcessor, PassthroughProcessor,
};
use duel_backend::config::EngineConfig;
use duel_backend::domain::{RoundLimit, RoundOutcome, UserId, WizardId};
use duel_backend::jobs::{JobRunner, RecordingScheduler};
use duel_backend::repos::Duel;
use duel_backend::services::duel_flow::{CreateDuel, DuelView};
use duel_backend::{build_state, AppState, DuelEngine};

use super::fakes::{FakeImageGenerator, ScriptedNarrator};

pub struct TestAppBuilder {
    config: EngineConfig,
    credits: InMemoryCreditLedger,
    images: FakeImageGenerator,
    processor: Arc<dyn ImageProcessor>,
}

impl TestAppBuilder {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_credits(mut self, user: &str, credits: u32) -> Self {
        self.credits = self.credits.with_balance(user, credits);
        self
    }

    pub fn with_images(mut self, images: FakeImageGenerator) -> Self {
        self.images = images;
        self
    }

    pub fn with_processor(mut self, processor: impl ImageProcessor + 'static) -> Self {
        self.processor = Arc::new(processor);
        self
    }

    pub async fn build(self) -> TestApp {
        let narrator = Arc::new(ScriptedNarrator::default());
        let images = Arc::new(self.images);
        let credits = Arc::new(self.credits);
        let storage = Arc::new(InMemoryObjectStorage::new());
        let wizards = Arc::new(InMemoryWizardRegistry::new());
        let scheduler = Arc::new(RecordingScheduler::new());

        let collaborators = Collaborators {
            narrator: narrator.clone(),
            images: ImageBackends {
                prompt_only: images.clone(),
                context_aware: images.clone(),
            },
            credits: credits.clone(),
            storage: storage.clone(),
            wizards: wizards.clone(),
            processor: self.processor,
        };

        let state = build_state()
            .with_db(DbKind::SqliteMemory)
            .with_collaborators(collaborators)
            .with_scheduler(scheduler.clone())
            .with_config(self.config)
            .build()
            .await
            .expect("build in-memory test state");
        let runner = JobRunner::new(state.engine.clone());

        TestApp {
            state,
            scheduler,
            runner,
            narrator,
            images,
            credits,
            storage,
            wizards,
        }
    }
}

pub struct TestApp {
    pub state: AppState,
    pub scheduler: Arc<RecordingScheduler>,
    pub runner: JobRunner,
    pub narrator: Arc<ScriptedNarrator>,
    pub images: Arc<FakeImageGenerator>,
    pub credits: Arc<InMemoryCreditLedger>,
    pub storage: Arc<InMemoryObjectStorage>,
    pub wizards: Arc<InMemoryWizardRegistry>,
}

pub fn wizard_ids(names: &[&str]) -> Vec<WizardId> {
    names.iter().map(|n| WizardId::from(*n)).collect()
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            config: EngineConfig::for_tests(),
            credits: InMemoryCreditLedger::new(),
            images: FakeImageGenerator::default(),
            processor: Arc::new(PassthroughProcessor),
        }
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    pub fn engine(&self) -> &DuelEngine {
        &self.state.engine
    }

    /// Drain and run every recorded job, including follow-ups.
    pub async fn run_jobs(&self) -> usize {
        self.runner
            .run_pending(&self.scheduler)
            .await
            .expect("recorded jobs should succeed")
    }

    pub async fn create_duel(&self, limit: RoundLimit, wizards: &[&str], owner: Option<&str>) -> Duel {
        self.engine()
            .create_duel(CreateDuel {
                round_limit: limit,
                wizards: wizard_ids(wizards),
                players: Vec::new(),
                created_by: owner.map(UserId::from),
                is_campaign: false,
            })
            .await
            .expect("create duel")
    }

    /// Create, start and introduce a duel; round 1 is open on return.
    pub async fn started_duel(&self, limit: RoundLimit, wizards: &[&str], owner: Option<&str>) -> Duel {
        let duel = self.create_duel(limit, wizards, owner).await;
        self.engine().start_duel(duel.id).await.expect("start duel");
        self.run_jobs().await;
        self.view(duel.id).await.duel
    }

    pub async fn view(&self, duel_id: i64) -> DuelView {
        self.engine().get_duel(duel_id).await.expect("read duel")
    }

    /// Every wizard casts; the narrator answers with `outcome`.
    pub async fn play_round(&self, duel_id: i64, outcome: RoundOutcome) {
        self.narrator.push(outcome);
        let duel = self.view(duel_id).await.duel;
        for wizard in &duel.wizards {
            self.engine()
                .submit_action(duel_id, wizard, "a spell")
                .await
                .expect("submit action");
        }
        self.run_jobs().await;
    }
}
