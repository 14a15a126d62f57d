use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Plan, Preferences, QuotaKind, QuotaSnapshot, StudentId};

// -- JWT Claims --

/// JWT claims shared by the REST middleware and token issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: StudentId,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub preferences: Option<Preferences>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub student_id: StudentId,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub student_id: StudentId,
    pub name: String,
    pub token: String,
}

// -- Swipes --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SwipeRequest {
    pub target_id: StudentId,
    pub is_like: bool,
    #[serde(default)]
    pub is_super_like: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResponse {
    pub is_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<i64>,
    pub remaining_super_likes: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored_profile_id: Option<StudentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_rewinds: Option<u32>,
}

/// Body of handler errors outside the undo endpoint. Middleware 401s and
/// axum extractor rejections keep axum's own responses.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_super_likes: Option<u32>,
}

// -- Profile & quota --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaResponse {
    pub plan: Plan,
    pub quotas: Vec<QuotaSnapshot>,
}

impl QuotaResponse {
    pub fn remaining(&self, kind: QuotaKind) -> Option<u32> {
        self.quotas.iter().find(|q| q.kind == kind).map(|q| q.remaining)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: StudentId,
    pub email: String,
    pub name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub preferences: Preferences,
    pub plan: Plan,
    pub boosted_until: Option<DateTime<Utc>>,
    pub quotas: Vec<QuotaSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePreferencesRequest {
    pub preferences: Preferences,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionRequest {
    pub plan: Plan,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostResponse {
    pub boosted_until: DateTime<Utc>,
    pub remaining_boosts: u32,
}

// -- Discovery & matches --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResponse {
    pub id: StudentId,
    pub name: String,
    pub gender: String,
    pub age: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub boosted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: i64,
    pub student_id: StudentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
