//! Duel routes: lifecycle, spell submission, reads and manual illustration.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::collaborators::ImageBackend;
use crate::domain::{PlayerId, RoundLimit, WizardId};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::{Caller, DuelId, RoundNumber, ValidatedJson};
use crate::services::duel_flow::CreateDuel;
use crate::services::illustration::IllustrationRequest;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDuelRequest {
    round_limit: RoundLimit,
    wizards: Vec<WizardId>,
    #[serde(default)]
    players: Vec<PlayerId>,
    #[serde(default)]
    is_campaign: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinDuelRequest {
    player_id: PlayerId,
    wizards: Vec<WizardId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitActionRequest {
    wizard_id: WizardId,
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IllustrateRequest {
    /// Overrides the prompt stored on the round's outcome.
    prompt: Option<String>,
    backend: Option<ImageBackend>,
    skip_image_generation: bool,
}

/// POST /api/duels
async fn create_duel(
    caller: Caller,
    body: ValidatedJson<CreateDuelRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let duel = app_state
        .engine()
        .create_duel(CreateDuel {
            round_limit: body.round_limit,
            wizards: body.wizards,
            players: body.players,
            created_by: caller.0,
            is_campaign: body.is_campaign,
        })
        .await?;
    Ok(HttpResponse::Created().json(duel))
}

/// GET /api/duels/{duel_id}
async fn get_duel(duel_id: DuelId, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let view = app_state.engine().get_duel(duel_id.0).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// GET /api/duels/code/{shortcode}
async fn get_duel_by_code(
    shortcode: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let view = app_state
        .engine()
        .get_duel_by_shortcode(&shortcode.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /api/duels/{duel_id}/join
async fn join_duel(
    duel_id: DuelId,
    body: ValidatedJson<JoinDuelRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let duel = app_state
        .engine()
        .join_duel(duel_id.0, body.player_id, body.wizards)
        .await?;
    Ok(HttpResponse::Ok().json(duel))
}

/// POST /api/duels/{duel_id}/start
async fn start_duel(duel_id: DuelId, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let duel = app_state.engine().start_duel(duel_id.0).await?;
    Ok(HttpResponse::Accepted().json(duel))
}

/// POST /api/duels/{duel_id}/cancel
async fn cancel_duel(duel_id: DuelId, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let duel = app_state.engine().cancel_duel(duel_id.0).await?;
    Ok(HttpResponse::Ok().json(duel))
}

/// POST /api/duels/{duel_id}/actions
async fn submit_action(
    duel_id: DuelId,
    body: ValidatedJson<SubmitActionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let round = app_state
        .engine()
        .submit_action(duel_id.0, &body.wizard_id, &body.text)
        .await?;
    Ok(HttpResponse::Accepted().json(round))
}

/// POST /api/duels/{duel_id}/rounds/{round_number}/illustration
///
/// Always 200 once the duel and round resolve: a failed render comes back as
/// a text-only result, not an error.
async fn illustrate_round(
    duel_id: DuelId,
    round_number: RoundNumber,
    caller: Caller,
    body: Option<web::Json<IllustrateRequest>>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let engine = app_state.engine();
    let body = body.map(web::Json::into_inner).unwrap_or_default();

    let result = match body.prompt {
        None if body.backend.is_none() && !body.skip_image_generation => {
            engine.illustrate_round(duel_id.0, round_number.0).await?
        }
        prompt => {
            let view = engine.get_duel(duel_id.0).await?;
            let stored = view
                .rounds
                .iter()
                .find(|r| r.round_number == round_number.0)
                .and_then(|r| r.outcome.as_ref())
                .and_then(|o| o.prompt())
                .map(str::to_owned);
            let prompt = prompt.or(stored).ok_or_else(|| {
                AppError::invalid(
                    ErrorCode::ValidationError,
                    format!("Round {} has no illustration prompt", round_number.0),
                )
            })?;
            let request = IllustrationRequest {
                prompt,
                duel_id: duel_id.0,
                round_number: round_number.0,
                backend: body.backend.unwrap_or(engine.config().default_image_backend),
                user_id: caller.0.or(view.duel.created_by),
                skip_image_generation: body.skip_image_generation,
            };
            engine.generate_round_illustration(request).await
        }
    };
    Ok(HttpResponse::Ok().json(result))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create_duel))
        .route("/code/{shortcode}", web::get().to(get_duel_by_code))
        .route("/{duel_id}", web::get().to(get_duel))
        .route("/{duel_id}/join", web::post().to(join_duel))
        .route("/{duel_id}/start", web::post().to(start_duel))
        .route("/{duel_id}/cancel", web::post().to(cancel_duel))
        .route("/{duel_id}/actions", web::post().to(submit_action))
        .route(
            "/{duel_id}/rounds/{round_number}/illustration",
            web::post().to(illustrate_round),
        );
}
