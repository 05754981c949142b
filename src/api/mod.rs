pub mod github;
pub mod repos;
pub mod search;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::analysis::AnalysisError;
use crate::state::AppState;

/// Build the application router over shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // GitHub passthrough
        .route("/api/github/search", get(github::search_github))
        .route("/api/github/repo/{owner}/{repo}", get(github::get_github_repo))
        // Catalog
        .route("/api/repos", get(repos::list_repos))
        .route("/api/repos/ingest/{owner}/{repo}", post(repos::ingest_repo))
        .route("/api/repos/{id}", get(repos::get_repo).delete(repos::delete_repo))
        .route("/api/repos/{id}/analyze", post(repos::analyze_repo))
        .route("/api/repos/{id}/tags", post(repos::add_manual_tag))
        // Search
        .route("/api/search", get(search::search))
        .route("/api/tags", get(search::list_tags))
        .route("/api/config", get(repos::get_config).put(repos::update_config))
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub app: String,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        app: state.config.app_name.clone(),
    })
}

/// The catalog could not be written; the change was not applied.
pub(crate) fn storage_error(e: anyhow::Error) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to save repository catalog: {e:#}"),
    )
}

/// A malformed model answer is the upstream's fault (502); an unreachable
/// model is an outage (503).
pub(crate) fn analysis_error(e: AnalysisError) -> (StatusCode, String) {
    tracing::error!("Architecture analysis failed: {e}");
    let status = if e.is_validation() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, format!("Analysis failed: {e}"))
}
