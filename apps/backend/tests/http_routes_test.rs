mod common;
mod support;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::assert_problem;
use duel_backend::routes;
use duel_backend::{RequestTrace, StructuredLogger};
use serde_json::{json, Value};
use support::TestApp;

macro_rules! service {
    ($app:expr) => {
        test::init_service(
            App::new()
                .wrap(StructuredLogger)
                .wrap(RequestTrace)
                .app_data(web::Data::new($app.state.clone()))
                .configure(routes::configure),
        )
        .await
    };
}

fn create_body() -> Value {
    json!({
        "roundLimit": {"type": "FIXED_ROUNDS", "rounds": 3},
        "wizards": ["merlin", "morgana"]
    })
}

#[actix_web::test]
async fn create_then_fetch_by_id_and_code() {
    let app = TestApp::new().await;
    let svc = service!(app);

    let req = test::TestRequest::post()
        .uri("/api/duels")
        .insert_header(("x-user-id", "alice"))
        .set_json(create_body())
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().contains_key("x-trace-id"));
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "WAITING_FOR_PLAYERS");
    assert_eq!(created["createdBy"], "alice");
    assert_eq!(created["currentRound"], 1);
    let id = created["id"].as_i64().unwrap();
    let code = created["shortcode"].as_str().unwrap().to_lowercase();

    let req = test::TestRequest::get().uri(&format!("/api/duels/{id}")).to_request();
    let view: Value = test::call_and_read_body_json(&svc, req).await;
    assert_eq!(view["duel"]["id"], id);
    assert_eq!(view["rounds"], json!([]));

    let req = test::TestRequest::get()
        .uri(&format!("/api/duels/code/{code}"))
        .to_request();
    let view: Value = test::call_and_read_body_json(&svc, req).await;
    assert_eq!(view["duel"]["id"], id);
}

#[actix_web::test]
async fn missing_duel_is_problem_details_404() {
    let app = TestApp::new().await;
    let svc = service!(app);

    let req = test::TestRequest::get().uri("/api/duels/9999").to_request();
    let resp = test::call_service(&svc, req).await;
    assert_problem(resp, StatusCode::NOT_FOUND, "DUEL_NOT_FOUND", Some("9999")).await;
}

#[actix_web::test]
async fn bad_path_and_body_are_400() {
    let app = TestApp::new().await;
    let svc = service!(app);

    let req = test::TestRequest::get().uri("/api/duels/abc").to_request();
    let resp = test::call_service(&svc, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "INVALID_DUEL_ID", None).await;

    let req = test::TestRequest::post()
        .uri("/api/duels")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "BAD_REQUEST", Some("Invalid JSON")).await;

    let req = test::TestRequest::post()
        .uri("/api/duels")
        .set_json(json!({
            "roundLimit": {"type": "TO_THE_DEATH"},
            "wizards": ["merlin", "merlin"]
        }))
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "VALIDATION_ERROR", None).await;
}

#[actix_web::test]
async fn start_and_cast_over_http() {
    let app = TestApp::new().await;
    let svc = service!(app);
    let duel = app
        .create_duel(duel_backend::domain::RoundLimit::ToTheDeath, &["a", "b"], None)
        .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/duels/{}/actions", duel.id))
        .set_json(json!({"wizardId": "a", "text": "too soon"}))
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_problem(resp, StatusCode::CONFLICT, "INVALID_STATE", None).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/duels/{}/start", duel.id))
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    app.run_jobs().await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/duels/{}/actions", duel.id))
        .set_json(json!({"wizardId": "a", "text": "fireball"}))
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let round: Value = test::read_body_json(resp).await;
    assert_eq!(round["roundNumber"], 1);
    assert_eq!(round["status"], "WAITING_FOR_SPELLS");
    assert_eq!(round["spells"]["a"]["text"], "fireball");

    let req = test::TestRequest::post()
        .uri(&format!("/api/duels/{}/actions", duel.id))
        .set_json(json!({"wizardId": "nobody", "text": "hello"}))
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_problem(resp, StatusCode::NOT_FOUND, "WIZARD_NOT_FOUND", None).await;
}

#[actix_web::test]
async fn outcome_callback_completes_round() {
    let app = TestApp::new().await;
    let svc = service!(app);
    let duel = app
        .started_duel(duel_backend::domain::RoundLimit::ToTheDeath, &["a", "b"], None)
        .await;
    for wizard in ["a", "b"] {
        app.engine()
            .submit_action(duel.id, &wizard.into(), "zap")
            .await
            .unwrap();
    }
    // The callback stands in for the narration job.
    app.scheduler.drain();
    let round_id = app.view(duel.id).await.rounds[1].id;

    let body = json!({"narrative": "Both are singed", "healthDelta": {"a": -10, "b": -15}});
    let req = test::TestRequest::post()
        .uri(&format!("/api/rounds/{round_id}/outcome"))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let round: Value = test::read_body_json(resp).await;
    assert_eq!(round["status"], "COMPLETED");

    let view = app.view(duel.id).await;
    assert_eq!(view.duel.hit_points.get(&"a".into()), 90);
    assert_eq!(view.duel.hit_points.get(&"b".into()), 85);

    let req = test::TestRequest::post()
        .uri(&format!("/api/rounds/{round_id}/retrigger"))
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_problem(resp, StatusCode::CONFLICT, "INVALID_STATE", None).await;

    let req = test::TestRequest::post()
        .uri("/api/rounds/0/outcome")
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&svc, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "INVALID_ROUND_ID", None).await;
}

#[actix_web::test]
async fn illustration_route_reports_text_only_without_prompt() {
    let app = TestApp::new().await;
    let svc = service!(app);
    let duel = app
        .started_duel(duel_backend::domain::RoundLimit::ToTheDeath, &["a", "b"], None)
        .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/duels/{}/rounds/0/illustration", duel.id))
        .to_request();
    let result: Value = test::call_and_read_body_json(&svc, req).await;
    assert_eq!(result, json!({"success": true, "textOnlyMode": true}));

    let req = test::TestRequest::post()
        .uri(&format!("/api/duels/{}/rounds/0/illustration", duel.id))
        .set_json(json!({"prompt": "two wizards at dawn", "backend": "prompt_only"}))
        .to_request();
    let result: Value = test::call_and_read_body_json(&svc, req).await;
    assert_eq!(result["textOnlyMode"], false);
    assert!(result["storageRef"].is_string());
    assert_eq!(app.images.call_count(), 1);
}

#[actix_web::test]
async fn health_reports_database() {
    let app = TestApp::new().await;
    let svc = service!(app);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&svc, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "ok");
    assert!(body["migrations"].as_u64().unwrap() >= 1);
}
