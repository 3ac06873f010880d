use actix_web::{web, HttpResponse};

use crate::domain::RoundOutcome;
use crate::error::AppError;
use crate::extractors::{RoundId, ValidatedJson};
use crate::state::app_state::AppState;

/// POST /api/rounds/{round_id}/outcome
///
/// Narrator callback. Replays against a completed round are accepted and
/// return the round unchanged.
async fn apply_outcome(
    round_id: RoundId,
    body: ValidatedJson<RoundOutcome>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let round = app_state
        .engine()
        .apply_outcome(round_id.0, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(round))
}

/// POST /api/rounds/{round_id}/retrigger
async fn retrigger(round_id: RoundId, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let round = app_state.engine().retrigger_round(round_id.0).await?;
    Ok(HttpResponse::Accepted().json(round))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{round_id}/outcome", web::post().to(apply_outcome))
        .route("/{round_id}/retrigger", web::post().to(retrigger));
}
