use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::models::{GithubRepo, GithubSearchParams};
use crate::state::AppState;

#[derive(Serialize)]
pub struct GithubSearchResponse {
    pub count: usize,
    pub repositories: Vec<GithubRepo>,
}

/// GET /api/github/search - Query GitHub without storing anything
pub async fn search_github(
    State(state): State<AppState>,
    Query(params): Query<GithubSearchParams>,
) -> Result<Json<GithubSearchResponse>, (StatusCode, String)> {
    if !(1..=100).contains(&params.max_results) {
        return Err((
            StatusCode::BAD_REQUEST,
            "max_results must be between 1 and 100".to_string(),
        ));
    }

    let repositories = state
        .github
        .search_repositories(&params)
        .await
        .map_err(|e| {
            tracing::warn!("GitHub search failed: {e:#}");
            (StatusCode::BAD_GATEWAY, format!("GitHub search failed: {e}"))
        })?;

    Ok(Json(GithubSearchResponse {
        count: repositories.len(),
        repositories,
    }))
}

/// GET /api/github/repo/{owner}/{repo}
pub async fn get_github_repo(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<GithubRepo>, (StatusCode, String)> {
    let full_name = format!("{owner}/{repo}");
    match state.github.get_repository(&full_name).await {
        Ok(Some(repo)) => Ok(Json(repo)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Repository not found".to_string())),
        Err(e) => {
            tracing::warn!("GitHub lookup for {full_name} failed: {e:#}");
            Err((StatusCode::BAD_GATEWAY, format!("GitHub request failed: {e}")))
        }
    }
}
