use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::analysis::{self, manual_tag, reconcile};
use crate::models::{
    AnalysisResult, AnalyzeParams, ArchitectureTag, DetectionMethod, IngestParams,
    ListReposParams, LlmConfigUpdate, ManualTagRequest, Repository, RepositorySnapshot,
};
use crate::state::AppState;

use super::{analysis_error, storage_error};

/// GET /api/repos - List stored repos, most starred first
pub async fn list_repos(
    State(state): State<AppState>,
    Query(params): Query<ListReposParams>,
) -> Result<Json<Vec<Repository>>, (StatusCode, String)> {
    if !(1..=200).contains(&params.limit) {
        return Err((
            StatusCode::BAD_REQUEST,
            "limit must be between 1 and 200".to_string(),
        ));
    }

    let language = params
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_lowercase);

    let mut repos: Vec<Repository> = state
        .repos
        .read()
        .iter()
        .filter(|r| r.stars >= params.min_stars)
        .filter(|r| match &language {
            Some(wanted) => r
                .language
                .as_deref()
                .is_some_and(|l| l.to_lowercase().contains(wanted.as_str())),
            None => true,
        })
        .cloned()
        .collect();

    repos.sort_by(|a, b| b.stars.cmp(&a.stars));
    repos.truncate(params.limit);
    Ok(Json(repos))
}

/// GET /api/repos/{id}
pub async fn get_repo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Repository>, (StatusCode, String)> {
    state
        .find_repo(id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Repository not found".to_string()))
}

/// POST /api/repos/ingest/{owner}/{repo} - Fetch from GitHub, classify, store
///
/// An already stored repository is returned as-is with 200.
pub async fn ingest_repo(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<IngestParams>,
) -> Result<(StatusCode, Json<Repository>), (StatusCode, String)> {
    let full_name = format!("{owner}/{repo}");

    if let Some(existing) = state.find_by_full_name(&full_name) {
        return Ok((StatusCode::OK, Json(existing)));
    }

    let meta = state
        .github
        .get_repository(&full_name)
        .await
        .map_err(|e| {
            tracing::warn!("GitHub lookup for {full_name} failed: {e:#}");
            (StatusCode::BAD_GATEWAY, format!("GitHub request failed: {e}"))
        })?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Repository not found on GitHub".to_string(),
        ))?;

    let readme = state.github.get_readme(&full_name).await;
    let has_readme = readme.as_deref().is_some_and(|r| !r.trim().is_empty());

    let run_analyzer = params.analyze && has_readme;
    if run_analyzer {
        let llm = state.llm_config.read();
        if llm.requires_api_key() && !llm.has_api_key() {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("No API key configured for LLM provider '{}'", llm.provider),
            ));
        }
    }

    let file_paths = state.github.get_file_tree(&full_name).await;
    tracing::info!("Ingesting {full_name}: {} paths, readme: {has_readme}", file_paths.len());

    let mut record = Repository {
        id: Uuid::new_v4(),
        name: meta.name,
        full_name: meta.full_name,
        url: meta.url,
        language: meta.language,
        stars: meta.stars,
        description: Some(meta.description).filter(|d| !d.is_empty()),
        readme_content: readme,
        last_indexed: Utc::now(),
        architecture_tags: Vec::new(),
    };

    let snapshot = RepositorySnapshot::from_repository(&record, file_paths);
    let analyzer = run_analyzer.then(|| state.analyzer());
    let classification = analysis::classify(&snapshot, analyzer.as_ref())
        .await
        .map_err(analysis_error)?;
    record.architecture_tags = classification.tags;

    let (stored, inserted) = state.insert_repo(record).map_err(storage_error)?;
    if inserted {
        tracing::info!(
            "Stored {} with {} tags",
            stored.full_name,
            stored.architecture_tags.len()
        );
        Ok((StatusCode::CREATED, Json(stored)))
    } else {
        Ok((StatusCode::OK, Json(stored)))
    }
}

/// POST /api/repos/{id}/analyze - Re-run the analyzer on a stored repo
///
/// With `persist=true` the repo's generative-analysis tags are replaced by
/// the new result; heuristic and manual tags are kept.
pub async fn analyze_repo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<AnalysisResult>, (StatusCode, String)> {
    let repo = state
        .find_repo(id)
        .ok_or((StatusCode::NOT_FOUND, "Repository not found".to_string()))?;

    let readme = repo
        .readme_content
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or((
            StatusCode::BAD_REQUEST,
            "Repository has no README content".to_string(),
        ))?;

    let file_tree = state.github.get_file_tree(&repo.full_name).await;
    let result = state
        .analyzer()
        .analyze(readme, &repo.full_name, Some(file_tree.as_slice()))
        .await
        .map_err(analysis_error)?;

    if params.persist {
        let tags = reconcile(id, Some(&result), None);
        state
            .replace_tags(id, DetectionMethod::GenerativeAnalysis, tags)
            .map_err(storage_error)?
            .ok_or((StatusCode::NOT_FOUND, "Repository not found".to_string()))?;
        tracing::info!("Replaced analysis tags for {}", repo.full_name);
    }

    Ok(Json(result))
}

/// DELETE /api/repos/{id} - Remove a repo and its tags
pub async fn delete_repo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.delete_repo(id).map_err(storage_error)? {
        tracing::info!("Deleted repository {id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Repository not found".to_string()))
    }
}

/// POST /api/repos/{id}/tags - Attach a manually curated tag
pub async fn add_manual_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ManualTagRequest>,
) -> Result<(StatusCode, Json<ArchitectureTag>), (StatusCode, String)> {
    let tag = manual_tag(id, &req.tag, req.tag_type, req.confidence_score).ok_or((
        StatusCode::BAD_REQUEST,
        "Tag must be non-blank with confidence_score between 0 and 1".to_string(),
    ))?;

    state
        .add_tag(id, tag.clone())
        .map_err(storage_error)?
        .ok_or((StatusCode::NOT_FOUND, "Repository not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(tag)))
}

/// GET /api/config - Get current LLM config (API key redacted)
pub async fn get_config(State(state): State<AppState>) -> Json<LlmConfigResponse> {
    Json(config_response(&state))
}

/// Config response with API key redacted
#[derive(serde::Serialize)]
pub struct LlmConfigResponse {
    pub provider: String,
    pub base_url: String,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub has_api_key: bool,
    pub github_configured: bool,
}

fn config_response(state: &AppState) -> LlmConfigResponse {
    let config = state.llm_config.read();
    LlmConfigResponse {
        provider: config.provider.clone(),
        base_url: config.base_url.clone(),
        chat_model: config.chat_model.clone(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        has_api_key: config.has_api_key(),
        github_configured: state.github.has_token(),
    }
}

/// PUT /api/config - Update LLM config
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<LlmConfigUpdate>,
) -> Result<Json<LlmConfigResponse>, (StatusCode, String)> {
    if let Some(provider) = &update.provider {
        if provider != "openai" && provider != "ollama" {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Unknown LLM provider: {provider}"),
            ));
        }
    }
    if let Some(temperature) = update.temperature {
        if !(0.0..=1.0).contains(&temperature) {
            return Err((
                StatusCode::BAD_REQUEST,
                "temperature must be between 0 and 1".to_string(),
            ));
        }
    }
    if update.max_tokens == Some(0) {
        return Err((
            StatusCode::BAD_REQUEST,
            "max_tokens must be positive".to_string(),
        ));
    }

    {
        let mut config = state.llm_config.write();

        if let Some(provider) = update.provider {
            config.provider = provider;
        }
        // base_url is immutable at runtime (LLM_BASE_URL only)
        if let Some(chat_model) = update.chat_model {
            config.chat_model = chat_model;
        }
        if let Some(api_key) = update.api_key {
            config.api_key = Some(api_key);
        }
        if let Some(temperature) = update.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = update.max_tokens {
            config.max_tokens = max_tokens;
        }
        tracing::info!("LLM config updated: {} / {}", config.provider, config.chat_model);
    }

    Ok(Json(config_response(&state)))
}
