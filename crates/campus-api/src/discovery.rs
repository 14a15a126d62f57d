use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

use campus_types::api::{CandidateResponse, Claims};

use crate::error::ApiError;
use crate::{AppState, blocking};

const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// GET /discover: the caller's candidate queue.
pub async fn discover(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub;
    let limit = query.limit.min(MAX_LIMIT);
    let now = Utc::now();

    let candidates = blocking(&state, move |engine| engine.discover(viewer, limit, now)).await?;

    let body: Vec<CandidateResponse> = candidates
        .into_iter()
        .map(|c| CandidateResponse {
            id: c.student.id,
            name: c.student.name,
            gender: c.student.gender,
            age: c.age,
            distance_km: c.distance_km.map(|d| (d * 10.0).round() / 10.0),
            boosted: c.boosted,
        })
        .collect();

    Ok(Json(body))
}
