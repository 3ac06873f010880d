//! Scriptable collaborators for integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use duel_backend::collaborators::{
    CollaboratorError, ConclusionContext, GenerationContext, ImageGenerator, IntroductionContext,
    Narrator, RoundContext,
};
use duel_backend::domain::RoundOutcome;
use parking_lot::Mutex;

/// PNG signature followed by filler; enough for content sniffing.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-body";

/// Narrator that replays queued outcomes in order. An empty queue yields a
/// plain narrative with no score changes.
#[derive(Default)]
pub struct ScriptedNarrator {
    intro: Mutex<Option<RoundOutcome>>,
    queued: Mutex<VecDeque<RoundOutcome>>,
    pub introduced: AtomicUsize,
    pub resolved: AtomicUsize,
    pub concluded: AtomicUsize,
    pub last_round: Mutex<Option<RoundContext>>,
    pub last_conclusion: Mutex<Option<ConclusionContext>>,
}

impl ScriptedNarrator {
    pub fn set_intro(&self, outcome: RoundOutcome) {
        *self.intro.lock() = Some(outcome);
    }

    pub fn push(&self, outcome: RoundOutcome) {
        self.queued.lock().push_back(outcome);
    }
}

#[async_trait]
impl Narrator for ScriptedNarrator {
    async fn introduce(&self, ctx: IntroductionContext) -> Result<RoundOutcome, CollaboratorError> {
        self.introduced.fetch_add(1, Ordering::SeqCst);
        Ok(self.intro.lock().clone().unwrap_or_else(|| {
            RoundOutcome::narrative(format!("{} wizards enter the arena", ctx.wizards.len()))
        }))
    }

    async fn resolve_round(&self, ctx: RoundContext) -> Result<RoundOutcome, CollaboratorError> {
        self.resolved.fetch_add(1, Ordering::SeqCst);
        let round_number = ctx.round_number;
        *self.last_round.lock() = Some(ctx);
        Ok(self
            .queued
            .lock()
            .pop_front()
            .unwrap_or_else(|| RoundOutcome::narrative(format!("Round {round_number} passes"))))
    }

    async fn conclude(&self, ctx: ConclusionContext) -> Result<RoundOutcome, CollaboratorError> {
        self.concluded.fetch_add(1, Ordering::SeqCst);
        *self.last_conclusion.lock() = Some(ctx);
        Ok(RoundOutcome::narrative("The dust settles"))
    }
}

/// Image backend returning [`FAKE_PNG`], or failing when told to.
#[derive(Default)]
pub struct FakeImageGenerator {
    pub calls: AtomicUsize,
    fail: AtomicBool,
    pub contexts: Mutex<Vec<GenerationContext>>,
}

impl FakeImageGenerator {
    pub fn failing() -> Self {
        let generator = Self::default();
        generator.fail.store(true, Ordering::SeqCst);
        generator
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_context(&self) -> Option<GenerationContext> {
        self.contexts.lock().last().cloned()
    }
}

#[async_trait]
impl ImageGenerator for FakeImageGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        ctx: GenerationContext,
    ) -> Result<Vec<u8>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().push(ctx);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable("renderer on fire".into()));
        }
        Ok(FAKE_PNG.to_vec())
    }
}
