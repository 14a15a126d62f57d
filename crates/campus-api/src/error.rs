use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use campus_match::MatchError;
use campus_types::api::ErrorBody;
use campus_types::models::QuotaKind;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] MatchError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Engine(e) => match e {
                MatchError::InvalidTarget
                | MatchError::TargetUnavailable
                | MatchError::QuotaExhausted(_)
                | MatchError::NothingToUndo => StatusCode::BAD_REQUEST,
                MatchError::DuplicateSwipe | MatchError::EmailTaken => StatusCode::CONFLICT,
                MatchError::StudentNotFound | MatchError::MatchNotFound => StatusCode::NOT_FOUND,
                MatchError::AccountSuspended => StatusCode::FORBIDDEN,
                MatchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Engine(e) => e.kind(),
            Self::BadRequest(_) => "BadRequest",
            Self::Unauthorized => "Unauthorized",
            Self::Internal => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            Self::Engine(MatchError::Storage(e)) => {
                error!("Storage failure: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let remaining_super_likes = match &self {
            Self::Engine(MatchError::QuotaExhausted(QuotaKind::SuperLike)) => Some(0),
            _ => None,
        };

        let body = ErrorBody {
            error: self.kind().to_string(),
            message,
            remaining_super_likes,
        };
        (status, Json(body)).into_response()
    }
}
