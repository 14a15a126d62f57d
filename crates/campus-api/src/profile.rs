use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use campus_match::MatchError;
use campus_types::api::{
    BoostResponse, Claims, ProfileResponse, QuotaResponse, SubscriptionRequest, UpdatePreferencesRequest,
};

use crate::auth::validate_preferences;
use crate::error::ApiError;
use crate::{AppState, blocking};

/// GET /me: own profile with live quota balances.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let me = claims.sub;
    let now = Utc::now();

    let (student, quotas) = blocking(&state, move |engine| {
        let (_, quotas) = engine.quotas(me, now)?;
        let student = engine
            .db()
            .get_student(me)?
            .ok_or(MatchError::StudentNotFound)?
            .into_student();
        Ok((student, quotas))
    })
    .await?;

    Ok(Json(ProfileResponse {
        id: student.id,
        email: student.email,
        name: student.name,
        gender: student.gender,
        date_of_birth: student.date_of_birth,
        preferences: student.preferences,
        plan: student.plan,
        boosted_until: student.boosted_until,
        quotas,
    }))
}

/// PUT /me/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_preferences(&req.preferences)?;
    let me = claims.sub;

    let updated = blocking(&state, move |engine| {
        Ok(engine
            .db()
            .update_preferences(me, &req.preferences, req.latitude, req.longitude)?)
    })
    .await?;

    if !updated {
        return Err(MatchError::StudentNotFound.into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /quota
pub async fn quota(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let me = claims.sub;
    let now = Utc::now();

    let (plan, quotas) = blocking(&state, move |engine| engine.quotas(me, now)).await?;
    Ok(Json(QuotaResponse { plan, quotas }))
}

/// PUT /subscription: switches plan. Balances move to the new ceilings within the current window.
pub async fn change_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let me = claims.sub;
    let now = Utc::now();
    let plan = req.plan;

    let quotas = blocking(&state, move |engine| engine.change_plan(me, plan, now)).await?;
    Ok(Json(QuotaResponse { plan, quotas }))
}

/// POST /boost
pub async fn boost(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let me = claims.sub;
    let now = Utc::now();

    let (boosted_until, remaining_boosts) = blocking(&state, move |engine| engine.boost(me, now)).await?;
    Ok(Json(BoostResponse {
        boosted_until,
        remaining_boosts,
    }))
}
