use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::models::{RankedRepository, SearchParams, TagSummary, TagsParams};
use crate::search::relevance::{self, ScoreOptions};
use crate::search::tags;
use crate::state::AppState;

/// GET /api/search - Rank stored repositories against a free-text query
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<RankedRepository>>, (StatusCode, String)> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }
    if !(0.0..=1.0).contains(&params.min_confidence) {
        return Err((
            StatusCode::BAD_REQUEST,
            "min_confidence must be between 0 and 1".to_string(),
        ));
    }
    if !(1..=100).contains(&params.limit) {
        return Err((
            StatusCode::BAD_REQUEST,
            "limit must be between 1 and 100".to_string(),
        ));
    }

    // Score a snapshot so the lock isn't held while ranking
    let repos = state.repos.read().clone();
    let options = ScoreOptions {
        min_confidence: params.min_confidence,
        limit: params.limit,
    };
    let results = relevance::score(query, &repos, &options);
    tracing::info!("Search '{query}' matched {} of {} repositories", results.len(), repos.len());

    Ok(Json(results))
}

/// GET /api/tags - Every distinct tag with usage count and mean confidence
pub async fn list_tags(
    State(state): State<AppState>,
    Query(params): Query<TagsParams>,
) -> Json<Vec<TagSummary>> {
    let repos = state.repos.read();
    Json(tags::summarize(&repos, params.tag_type))
}
