mod common;
mod support;

use duel_backend::collaborators::{
    CreditLedger, CreditMetadata, ImageBackend, ObjectStorage, ResizeJpegProcessor, WizardProfile,
};
use duel_backend::domain::{DuelStatus, ImageRef, RoundLimit, RoundOutcome, RoundStatus, UserId, WizardId};
use duel_backend::services::illustration::{IllustrationRequest, TextOnlyReason};
use support::fakes::{FakeImageGenerator, FAKE_PNG};
use support::TestApp;

fn illustrated(text: &str) -> RoundOutcome {
    RoundOutcome::narrative(text).with_illustration_prompt(format!("{text}, painted"))
}

async fn profile(app: &TestApp, id: &str, with_portrait: bool) -> Option<ImageRef> {
    let portrait = if with_portrait {
        Some(app.storage.store(FAKE_PNG.to_vec(), "image/png").await.unwrap())
    } else {
        None
    };
    app.wizards.insert_profile(WizardProfile {
        id: WizardId::from(id),
        name: id.to_uppercase(),
        description: format!("{id} wears a tall hat"),
        illustration: portrait.clone(),
    });
    portrait
}

#[tokio::test]
async fn insufficient_credits_degrade_to_text_only() {
    let app = TestApp::builder().with_credits("alice", 0).build().await;
    let duel = app
        .started_duel(RoundLimit::ToTheDeath, &["a", "b"], Some("alice"))
        .await;

    app.play_round(duel.id, illustrated("A storm of ravens")).await;

    let view = app.view(duel.id).await;
    let round = &view.rounds[1];
    assert_eq!(round.status, RoundStatus::Completed);
    assert!(round.illustration().is_none());
    assert_eq!(view.duel.status, DuelStatus::InProgress);
    assert_eq!(app.images.call_count(), 0);

    let result = app.engine().illustrate_round(duel.id, 1).await.unwrap();
    assert!(result.success);
    assert!(result.text_only_mode);
    assert_eq!(result.reason, Some(TextOnlyReason::InsufficientCredits));
}

#[tokio::test]
async fn one_credit_covers_the_whole_duel() {
    let app = TestApp::builder().with_credits("alice", 1).build().await;
    let duel = app
        .started_duel(RoundLimit::ToTheDeath, &["a", "b"], Some("alice"))
        .await;

    app.play_round(duel.id, illustrated("First clash")).await;
    app.play_round(duel.id, illustrated("Second clash")).await;

    let view = app.view(duel.id).await;
    assert!(view.rounds[1].illustration().is_some());
    assert!(view.rounds[2].illustration().is_some());
    assert_eq!(app.credits.balance(&UserId::from("alice")), 0);
    assert_eq!(app.images.call_count(), 2);

    let again = app
        .credits
        .consume_image_credit_for_duel(
            &UserId::from("alice"),
            duel.id,
            CreditMetadata {
                round_number: 3,
                backend: ImageBackend::PromptOnly,
            },
        )
        .await
        .unwrap();
    assert!(again.success);
    assert!(again.already_consumed);
}

#[tokio::test]
async fn generator_failure_keeps_round_completed() {
    let app = TestApp::builder()
        .with_images(FakeImageGenerator::failing())
        .build()
        .await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;

    app.play_round(duel.id, illustrated("Lightning everywhere")).await;

    let view = app.view(duel.id).await;
    assert_eq!(view.rounds[1].status, RoundStatus::Completed);
    assert!(view.rounds[1].illustration().is_none());
    assert_eq!(view.duel.current_round, 2);

    let result = app.engine().illustrate_round(duel.id, 1).await.unwrap();
    assert!(result.text_only_mode);
    assert_eq!(result.reason, Some(TextOnlyReason::ImageGenerationFailed));

    app.images.set_failing(false);
    let result = app.engine().illustrate_round(duel.id, 1).await.unwrap();
    assert!(!result.text_only_mode);
    let stored = result.storage_ref.expect("stored image");
    assert_eq!(app.storage.content_type(&stored).as_deref(), Some("image/png"));
}

#[tokio::test]
async fn skip_flag_never_calls_the_generator() {
    let app = TestApp::builder().with_credits("alice", 5).build().await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;
    app.play_round(duel.id, RoundOutcome::narrative("quiet")).await;

    let result = app
        .engine()
        .generate_round_illustration(IllustrationRequest {
            prompt: "a quiet field".into(),
            duel_id: duel.id,
            round_number: 1,
            backend: ImageBackend::ContextAware,
            user_id: Some(UserId::from("alice")),
            skip_image_generation: true,
        })
        .await;

    assert!(result.success);
    assert!(result.text_only_mode);
    assert_eq!(result.reason, None);
    assert_eq!(app.images.call_count(), 0);
    assert_eq!(app.credits.balance(&UserId::from("alice")), 5);
}

#[tokio::test]
async fn round_without_prompt_is_not_illustrated() {
    let app = TestApp::new().await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;
    app.play_round(duel.id, RoundOutcome::narrative("no picture")).await;

    assert_eq!(app.images.call_count(), 0);
    let result = app.engine().illustrate_round(duel.id, 1).await.unwrap();
    assert!(result.text_only_mode);
    assert_eq!(result.reason, None);
}

#[tokio::test]
async fn introduction_uses_portraits_and_sets_featured_illustration() {
    let app = TestApp::new().await;
    let portrait_a = profile(&app, "a", true).await.unwrap();
    let portrait_b = profile(&app, "b", true).await.unwrap();
    app.narrator
        .set_intro(illustrated("Two wizards bow"));

    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;

    let ctx = app.images.last_context().expect("generator called");
    let refs: Vec<_> = ctx.reference_images.iter().map(|r| r.image_ref.clone()).collect();
    assert_eq!(refs, vec![portrait_a, portrait_b]);
    assert!(ctx.reference_images.iter().all(|r| r.bytes == FAKE_PNG));

    let view = app.view(duel.id).await;
    let intro_image = view.rounds[0].illustration().cloned().expect("intro illustrated");
    assert_eq!(view.duel.featured_illustration, Some(intro_image));
}

#[tokio::test]
async fn later_rounds_reference_the_previous_illustration() {
    let app = TestApp::new().await;
    profile(&app, "a", false).await;
    profile(&app, "b", false).await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;

    app.play_round(duel.id, illustrated("Opening volley")).await;
    // Round 2 has no prompt; round 3 should still see round 1's image.
    app.play_round(duel.id, RoundOutcome::narrative("a breather")).await;
    app.play_round(duel.id, illustrated("Final stand")).await;

    let view = app.view(duel.id).await;
    let first = view.rounds[1].illustration().cloned().expect("round 1 illustrated");
    assert!(view.rounds[3].illustration().is_some());
    assert_eq!(view.duel.featured_illustration, None);

    let ctx = app.images.last_context().unwrap();
    assert_eq!(ctx.reference_images.len(), 1);
    assert_eq!(ctx.reference_images[0].image_ref, first);
    assert_eq!(
        ctx.wizard_descriptions,
        vec!["A: a wears a tall hat".to_string(), "B: b wears a tall hat".to_string()]
    );
}

#[tokio::test]
async fn prompt_only_backend_gets_no_context() {
    let app = TestApp::new().await;
    profile(&app, "a", true).await;
    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;
    app.play_round(duel.id, RoundOutcome::narrative("plain")).await;

    let result = app
        .engine()
        .generate_round_illustration(IllustrationRequest {
            prompt: "plain field".into(),
            duel_id: duel.id,
            round_number: 1,
            backend: ImageBackend::PromptOnly,
            user_id: None,
            skip_image_generation: false,
        })
        .await;

    assert!(!result.text_only_mode);
    let ctx = app.images.last_context().unwrap();
    assert!(ctx.reference_images.is_empty());
    assert!(ctx.wizard_descriptions.is_empty());
}

#[tokio::test]
async fn undecodable_image_is_stored_uncompressed() {
    let app = TestApp::builder()
        .with_processor(ResizeJpegProcessor {
            max_dimension: 64,
            quality: 80,
        })
        .build()
        .await;
    app.narrator.set_intro(illustrated("Two wizards bow"));

    let duel = app.started_duel(RoundLimit::ToTheDeath, &["a", "b"], None).await;

    let view = app.view(duel.id).await;
    let stored = view.rounds[0].illustration().cloned().expect("intro illustrated");
    assert_eq!(view.duel.featured_illustration.as_ref(), Some(&stored));
    assert_eq!(app.storage.content_type(&stored).as_deref(), Some("image/png"));
    assert_eq!(app.storage.fetch(&stored).await.unwrap(), FAKE_PNG);

    let result = app.engine().illustrate_round(duel.id, 0).await.unwrap();
    assert!(result.success);
    assert!(!result.text_only_mode);
    assert_eq!(result.storage_ref, Some(stored));
}
