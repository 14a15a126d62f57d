use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use campus_types::api::Claims;
use campus_types::models::StudentId;

use crate::error::ApiError;
use crate::{AppState, blocking};

/// POST /blocks/{student_id}. Idempotent; ends any match with that student.
pub async fn block_student(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let me = claims.sub;
    let now = Utc::now();
    blocking(&state, move |engine| engine.block(me, student_id, now)).await?;
    Ok(StatusCode::NO_CONTENT)
}
