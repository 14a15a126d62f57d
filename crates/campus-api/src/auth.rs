use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, warn};

use campus_db::models::NewStudent;
use campus_match::MatchError;
use campus_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use campus_types::models::{Preferences, StudentId};

use crate::error::ApiError;
use crate::{AppState, blocking};

const MIN_AGE: u32 = 18;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    validate_registration(&state, &email, &req)?;

    let preferences = req.preferences.unwrap_or_default();
    let now = Utc::now();

    let token_email = email.clone();
    let student_id = blocking(&state, move |engine| {
        let password_hash = hash_password(&req.password)?;
        engine.register(
            &NewStudent {
                email: &email,
                password_hash: &password_hash,
                name: req.name.trim(),
                gender: &req.gender,
                date_of_birth: req.date_of_birth,
                preferences: &preferences,
                latitude: req.latitude,
                longitude: req.longitude,
            },
            now,
        )
    })
    .await?;

    let token = create_token(&state.jwt_secret, student_id, &token_email).map_err(|e| {
        error!("Token creation failed: {}", e);
        ApiError::Internal
    })?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { student_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();

    let student = blocking(&state, move |engine| {
        let row = engine
            .db()
            .get_student_by_email(&email)?
            .ok_or(MatchError::StudentNotFound)?;

        let parsed = PasswordHash::new(&row.password)
            .map_err(|e| anyhow::anyhow!("Stored hash for {} unreadable: {}", row.id, e))?;
        let verified = Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed)
            .is_ok();
        Ok(verified.then_some(row))
    })
    .await
    .map_err(|e| match e {
        ApiError::Engine(MatchError::StudentNotFound) => ApiError::Unauthorized,
        other => other,
    })?
    .ok_or(ApiError::Unauthorized)?;

    if student.is_banned {
        warn!("Suspended student {} attempted login", student.id);
        return Err(MatchError::AccountSuspended.into());
    }

    let token = create_token(&state.jwt_secret, student.id, &student.email).map_err(|e| {
        error!("Token creation failed: {}", e);
        ApiError::Internal
    })?;

    Ok(Json(LoginResponse {
        student_id: student.id,
        name: student.name,
        token,
    }))
}

fn validate_registration(state: &AppState, email: &str, req: &RegisterRequest) -> Result<(), ApiError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ApiError::BadRequest("Email address is invalid".into()));
    };
    if local.is_empty() || domain.is_empty() {
        return Err(ApiError::BadRequest("Email address is invalid".into()));
    }
    if let Some(required) = &state.email_domain {
        if !domain.eq_ignore_ascii_case(required) {
            return Err(ApiError::BadRequest(format!(
                "Registration requires an @{} address",
                required
            )));
        }
    }

    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("Password must be at least 8 characters".into()));
    }
    let name = req.name.trim();
    if name.is_empty() || name.chars().count() > 64 {
        return Err(ApiError::BadRequest("Name must be 1-64 characters".into()));
    }
    if req.gender.trim().is_empty() {
        return Err(ApiError::BadRequest("Gender is required".into()));
    }

    let age = Utc::now()
        .date_naive()
        .years_since(req.date_of_birth)
        .unwrap_or(0);
    if age < MIN_AGE {
        return Err(ApiError::BadRequest(format!("You must be at least {} to register", MIN_AGE)));
    }

    if let Some(prefs) = &req.preferences {
        validate_preferences(prefs)?;
    }
    Ok(())
}

pub(crate) fn validate_preferences(prefs: &Preferences) -> Result<(), ApiError> {
    if prefs.min_age < MIN_AGE || prefs.min_age > prefs.max_age {
        return Err(ApiError::BadRequest(format!(
            "Age range must start at {} or later and not be inverted",
            MIN_AGE
        )));
    }
    if prefs.max_distance_km.is_some_and(|d| !(d > 0.0)) {
        return Err(ApiError::BadRequest("Maximum distance must be positive".into()));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, MatchError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| MatchError::Storage(anyhow::anyhow!("Password hashing failed: {}", e)))
}

fn create_token(secret: &str, student_id: StudentId, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: student_id,
        email: email.to_string(),
        exp: (Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
