mod common;
mod support;

use std::sync::atomic::Ordering;

use duel_backend::domain::{DuelStatus, RoundLimit, RoundStatus, WizardId};
use duel_backend::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use duel_backend::jobs::{Job, JobHandler};
use support::TestApp;

fn w(id: &str) -> WizardId {
    WizardId::from(id)
}

#[tokio::test]
async fn last_submission_flips_round_and_schedules_narration() {
    let app = TestApp::new().await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;

    let first = app.engine().submit_action(duel.id, &w("a"), "frost bolt").await.unwrap();
    assert_eq!(first.status, RoundStatus::WaitingForSpells);
    assert!(app.scheduler.pending().is_empty());
    let pending = app.view(duel.id).await.duel.pending_actors;
    assert_eq!(pending.into_iter().collect::<Vec<_>>(), vec![w("b")]);

    let last = app.engine().submit_action(duel.id, &w("b"), "mirror shield").await.unwrap();
    assert_eq!(last.status, RoundStatus::Processing);
    assert_eq!(last.spells.len(), 2);
    assert_eq!(app.scheduler.pending(), vec![Job::NarrateRound { round_id: last.id }]);
}

#[tokio::test]
async fn resubmission_overwrites_spell() {
    let app = TestApp::new().await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b", "c"], None).await;

    app.engine().submit_action(duel.id, &w("a"), "first idea").await.unwrap();
    let round = app.engine().submit_action(duel.id, &w("a"), "better idea").await.unwrap();

    assert_eq!(round.spells.len(), 1);
    assert_eq!(round.spells[&w("a")].text, "better idea");
    assert_eq!(round.status, RoundStatus::WaitingForSpells);
}

#[tokio::test]
async fn submission_errors() {
    let app = TestApp::new().await;

    let waiting = app.create_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;
    let err = app.engine().submit_action(waiting.id, &w("a"), "early").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));

    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;
    let err = app.engine().submit_action(duel.id, &w("zed"), "hello").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Wizard, _)));

    let err = app.engine().submit_action(duel.id, &w("a"), "   ").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::EmptySpell, _)));

    let err = app.engine().submit_action(404, &w("a"), "void").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Duel, _)));

    // Round is PROCESSING once both have cast.
    app.engine().submit_action(duel.id, &w("a"), "one").await.unwrap();
    app.engine().submit_action(duel.id, &w("b"), "two").await.unwrap();
    let err = app.engine().submit_action(duel.id, &w("a"), "three").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}

#[tokio::test]
async fn concurrent_last_submitters_schedule_one_narration() {
    let app = TestApp::new().await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;

    let engine = app.engine();
    let (wa, wb) = (w("a"), w("b"));
    let (ra, rb) = tokio::join!(
        engine.submit_action(duel.id, &wa, "left"),
        engine.submit_action(duel.id, &wb, "right"),
    );
    ra.unwrap();
    rb.unwrap();

    let jobs = app.scheduler.pending();
    assert_eq!(jobs.len(), 1, "exactly one narration job, got {jobs:?}");

    let view = app.view(duel.id).await;
    let round = &view.rounds[1];
    assert_eq!(round.status, RoundStatus::Processing);
    assert_eq!(round.spells.len(), 2);
    assert!(view.duel.pending_actors.is_empty());
}

#[tokio::test]
async fn many_concurrent_submitters_keep_every_spell() {
    let app = TestApp::new().await;
    let names = ["a", "b", "c", "d", "e"];
    let duel = app.started_duel(RoundLimit::ToTheDeath, &names, None).await;

    let engine = app.engine();
    let ids: Vec<WizardId> = names.iter().map(|name| w(name)).collect();
    let submissions = ids
        .iter()
        .map(|id| engine.submit_action(duel.id, id, "chaos"));
    for result in futures_util::future::join_all(submissions).await {
        result.unwrap();
    }

    assert_eq!(app.scheduler.pending().len(), 1);
    let view = app.view(duel.id).await;
    assert_eq!(view.rounds[1].spells.len(), names.len());
    assert_eq!(view.duel.status, DuelStatus::InProgress);
}

#[tokio::test]
async fn retrigger_only_applies_to_processing_rounds() {
    let app = TestApp::new().await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;
    let round_id = app.view(duel.id).await.rounds[1].id;

    let err = app.engine().retrigger_round(round_id).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));

    app.engine().submit_action(duel.id, &w("a"), "x").await.unwrap();
    app.engine().submit_action(duel.id, &w("b"), "y").await.unwrap();
    // Narration job lost.
    app.scheduler.drain();

    app.engine().retrigger_round(round_id).await.unwrap();
    assert_eq!(app.scheduler.pending(), vec![Job::NarrateRound { round_id }]);
    app.run_jobs().await;

    let view = app.view(duel.id).await;
    assert_eq!(view.rounds[1].status, RoundStatus::Completed);
    assert_eq!(view.duel.current_round, 2);
}

#[tokio::test]
async fn replayed_narration_job_is_harmless() {
    let app = TestApp::new().await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;
    app.engine().submit_action(duel.id, &w("a"), "x").await.unwrap();
    let round = app.engine().submit_action(duel.id, &w("b"), "y").await.unwrap();

    app.run_jobs().await;
    app.runner
        .handle(&Job::NarrateRound { round_id: round.id })
        .await
        .unwrap();

    let view = app.view(duel.id).await;
    assert_eq!(view.rounds.len(), 3);
    assert_eq!(app.narrator.resolved.load(Ordering::SeqCst), 1);
}
