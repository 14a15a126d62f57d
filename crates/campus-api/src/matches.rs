use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use campus_types::api::{Claims, MatchResponse};
use campus_types::models::Match;

use crate::error::ApiError;
use crate::{AppState, blocking};

/// GET /matches: active matches, newest first.
pub async fn list_matches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let me = claims.sub;
    let rows = blocking(&state, move |engine| Ok(engine.db().get_active_matches(me)?)).await?;

    let matches: Vec<MatchResponse> = rows
        .into_iter()
        .map(|(row, name)| {
            let record: Match = row.into();
            MatchResponse {
                id: record.id,
                student_id: record.other(me),
                name,
                created_at: record.created_at,
            }
        })
        .collect();

    Ok(Json(matches))
}

/// POST /matches/{match_id}/unmatch
pub async fn unmatch(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let me = claims.sub;
    blocking(&state, move |engine| engine.unmatch(me, match_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
