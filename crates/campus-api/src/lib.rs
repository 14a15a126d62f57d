pub mod auth;
pub mod blocks;
pub mod discovery;
pub mod error;
pub mod matches;
pub mod middleware;
pub mod profile;
pub mod swipes;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tracing::error;

use campus_match::MatchEngine;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub engine: Arc<MatchEngine>,
    pub jwt_secret: String,
    /// When set, registration requires an address at this domain.
    pub email_domain: Option<String>,
}

/// Run blocking engine work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&MatchEngine) -> campus_match::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(|| async { "ok" }));

    let protected_routes = Router::new()
        .route("/swipe", post(swipes::swipe))
        .route("/swipe/undo", post(swipes::undo))
        .route("/discover", get(discovery::discover))
        .route("/matches", get(matches::list_matches))
        .route("/matches/{match_id}/unmatch", post(matches::unmatch))
        .route("/blocks/{student_id}", post(blocks::block_student))
        .route("/me", get(profile::me))
        .route("/me/preferences", put(profile::update_preferences))
        .route("/quota", get(profile::quota))
        .route("/subscription", put(profile::change_subscription))
        .route("/boost", post(profile::boost))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
