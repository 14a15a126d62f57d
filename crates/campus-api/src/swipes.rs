use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use campus_match::MatchError;
use campus_types::api::{Claims, SwipeRequest, SwipeResponse, UndoResponse};

use crate::error::ApiError;
use crate::{AppState, blocking};

/// POST /swipe
pub async fn swipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SwipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let swiper = claims.sub;
    let now = Utc::now();

    let outcome = blocking(&state, move |engine| {
        engine.record_swipe(swiper, req.target_id, req.is_like, req.is_super_like, now)
    })
    .await?;

    Ok(Json(SwipeResponse {
        is_match: outcome.is_match,
        match_id: outcome.match_id,
        remaining_super_likes: outcome.remaining_super_likes,
    }))
}

/// POST /swipe/undo. Expected refusals come back as `success: false`
/// with a 400 rather than the generic error body.
pub async fn undo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = claims.sub;
    let now = Utc::now();

    match blocking(&state, move |engine| engine.undo_last_swipe(student_id, now)).await {
        Ok(outcome) => Ok((
            StatusCode::OK,
            Json(UndoResponse {
                success: true,
                message: "Swipe undone".into(),
                restored_profile_id: Some(outcome.restored_profile_id),
                remaining_rewinds: Some(outcome.remaining_rewinds),
            }),
        )),
        Err(ApiError::Engine(e @ (MatchError::NothingToUndo | MatchError::QuotaExhausted(_)))) => Ok((
            StatusCode::BAD_REQUEST,
            Json(UndoResponse {
                success: false,
                message: e.to_string(),
                restored_profile_id: None,
                remaining_rewinds: None,
            }),
        )),
        Err(other) => Err(other),
    }
}
