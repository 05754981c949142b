use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::GithubConfig;
use crate::models::{GithubRepo, GithubSearchParams};

/// GitHub REST client supplying repository metadata, README text and file trees.
///
/// README and tree lookups degrade to "absent" on failure; only metadata and
/// search calls report errors.
#[derive(Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    config: GithubConfig,
}

#[derive(Deserialize)]
struct ApiRepo {
    name: String,
    full_name: String,
    html_url: String,
    language: Option<String>,
    stargazers_count: u64,
    description: Option<String>,
}

impl From<ApiRepo> for GithubRepo {
    fn from(repo: ApiRepo) -> Self {
        Self {
            name: repo.name,
            full_name: repo.full_name,
            url: repo.html_url,
            language: repo.language,
            stars: repo.stargazers_count,
            description: repo.description.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<ApiRepo>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

impl GithubClient {
    pub fn new(client: reqwest::Client, config: GithubConfig) -> Self {
        Self { client, config }
    }

    pub fn has_token(&self) -> bool {
        self.config.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.get_as(path, "application/vnd.github+json")
    }

    fn get_as(&self, path: &str, accept: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.config.api_base.trim_end_matches('/'));
        let req = self
            .client
            .get(url)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", "2022-11-28");
        match self.config.token.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Search repositories by language, stars and free text, most starred first.
    pub async fn search_repositories(&self, params: &GithubSearchParams) -> Result<Vec<GithubRepo>> {
        let q = build_search_query(params);
        let per_page = params.max_results.clamp(1, 100);
        let per_page_param = per_page.to_string();

        let resp = self
            .get("/search/repositories")
            .query(&[
                ("q", q.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page_param.as_str()),
            ])
            .send()
            .await
            .context("Failed to call GitHub search API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("GitHub search API returned {status}: {body}");
        }

        let body: SearchResponse = resp
            .json()
            .await
            .context("Failed to parse GitHub search response")?;

        Ok(body
            .items
            .into_iter()
            .take(per_page)
            .map(GithubRepo::from)
            .collect())
    }

    /// Fetch one repository by `owner/repo`. `Ok(None)` when it does not exist.
    pub async fn get_repository(&self, full_name: &str) -> Result<Option<GithubRepo>> {
        let resp = self
            .get(&format!("/repos/{full_name}"))
            .send()
            .await
            .with_context(|| format!("Failed to fetch repository {full_name}"))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("GitHub repos API returned {status}: {body}");
        }

        let repo: ApiRepo = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse repository {full_name}"))?;
        Ok(Some(repo.into()))
    }

    /// Raw README text, or `None` when the repository has none or GitHub fails.
    pub async fn get_readme(&self, full_name: &str) -> Option<String> {
        let result = self
            .get_as(
                &format!("/repos/{full_name}/readme"),
                "application/vnd.github.raw+json",
            )
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!("Failed to read README body for {full_name}: {e}");
                    None
                }
            },
            Ok(resp) => {
                tracing::info!("No README for {full_name} ({})", resp.status());
                None
            }
            Err(e) => {
                tracing::warn!("README request for {full_name} failed: {e}");
                None
            }
        }
    }

    /// File and directory paths, pre-order, down to the configured depth.
    ///
    /// Stops at `max_tree_entries`. A failing directory listing is skipped,
    /// so the result may be partial.
    pub async fn get_file_tree(&self, full_name: &str) -> Vec<String> {
        let mut paths = Vec::new();
        let max_entries = self.config.max_tree_entries;

        // (entry, remaining depth below it)
        let mut stack: Vec<(ContentEntry, usize)> = Vec::new();
        match self.list_dir(full_name, "").await {
            Ok(entries) => push_reversed(&mut stack, entries, self.config.tree_depth),
            Err(e) => {
                tracing::warn!("Failed to list {full_name}: {e:#}");
                return paths;
            }
        }

        while let Some((entry, depth)) = stack.pop() {
            if paths.len() >= max_entries {
                tracing::info!("File tree for {full_name} capped at {max_entries} entries");
                break;
            }
            paths.push(entry.path.clone());

            if entry.kind == "dir" && depth > 0 {
                match self.list_dir(full_name, &entry.path).await {
                    Ok(children) => push_reversed(&mut stack, children, depth - 1),
                    Err(e) => tracing::warn!("Failed to list {full_name}/{}: {e:#}", entry.path),
                }
            }
        }

        paths
    }

    async fn list_dir(&self, full_name: &str, path: &str) -> Result<Vec<ContentEntry>> {
        let endpoint = if path.is_empty() {
            format!("/repos/{full_name}/contents")
        } else {
            format!("/repos/{full_name}/contents/{path}")
        };

        let resp = self.get(&endpoint).send().await.context("GitHub contents request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("GitHub contents API returned {}", resp.status());
        }
        resp.json()
            .await
            .context("Failed to parse GitHub contents response")
    }
}

/// Push so that popping yields entries in their listed order.
fn push_reversed(stack: &mut Vec<(ContentEntry, usize)>, entries: Vec<ContentEntry>, depth: usize) {
    stack.extend(entries.into_iter().rev().map(|e| (e, depth)));
}

/// GitHub search syntax for the given filters.
fn build_search_query(params: &GithubSearchParams) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(query) = params.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        parts.push(query.to_string());
    }
    if let Some(language) = params.language.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        parts.push(format!("language:{language}"));
    }
    parts.push(format!("stars:>={}", params.min_stars));

    parts.join(" ")
}
