use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cataloged repository and the architecture tags it owns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    pub id: Uuid,
    pub name: String,
    /// `owner/repo`, unique across the catalog
    pub full_name: String,
    pub url: String,
    pub language: Option<String>,
    pub stars: u64,
    pub description: Option<String>,
    pub readme_content: Option<String>,
    pub last_indexed: DateTime<Utc>,
    #[serde(default)]
    pub architecture_tags: Vec<ArchitectureTag>,
}

/// Read-only view of a repository handed to the classifier.
/// `file_paths` may be truncated upstream.
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    pub id: Uuid,
    pub full_name: String,
    pub language: Option<String>,
    pub stars: u64,
    pub description: Option<String>,
    pub readme_text: Option<String>,
    pub file_paths: Vec<String>,
}

impl RepositorySnapshot {
    pub fn from_repository(repo: &Repository, file_paths: Vec<String>) -> Self {
        Self {
            id: repo.id,
            full_name: repo.full_name.clone(),
            language: repo.language.clone(),
            stars: repo.stars,
            description: repo.description.clone(),
            readme_text: repo.readme_content.clone(),
            file_paths,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    ArchitecturalPattern,
    DesignPattern,
    Infrastructure,
    Framework,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMethod {
    Heuristic,
    GenerativeAnalysis,
    Manual,
}

/// One labeled, confidence-scored classification of a repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchitectureTag {
    pub repository_id: Uuid,
    pub tag: String,
    pub tag_type: TagType,
    /// Always within [0, 1]
    pub confidence_score: f64,
    pub detection_method: DetectionMethod,
}

/// A named pattern with the detector's confidence in it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternCandidate {
    pub name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfrastructureCandidate {
    pub approach: String,
    pub confidence: f64,
}

/// Output of one generative analysis. Only ever handed out fully validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub architectural_patterns: Vec<PatternCandidate>,
    pub design_patterns: Vec<PatternCandidate>,
    pub infrastructure: Vec<InfrastructureCandidate>,
    pub frameworks: Vec<String>,
    pub summary: String,
}

/// A search result
#[derive(Debug, Clone, Serialize)]
pub struct RankedRepository {
    pub repository: Repository,
    pub relevance_score: f64,
    pub matched_tags: Vec<String>,
}

/// Catalog-wide statistics for one (tag, type) pair
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TagSummary {
    pub tag: String,
    #[serde(rename = "type")]
    pub tag_type: TagType,
    pub count: usize,
    pub avg_confidence: f64,
}

/// Architecture search query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_search_limit() -> usize {
    20
}

/// Repository listing filters
#[derive(Debug, Clone, Deserialize)]
pub struct ListReposParams {
    pub language: Option<String>,
    #[serde(default)]
    pub min_stars: u64,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestParams {
    #[serde(default = "default_true")]
    pub analyze: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeParams {
    /// Replace the repository's generative-analysis tags with the new result
    #[serde(default)]
    pub persist: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagsParams {
    pub tag_type: Option<TagType>,
}

/// Add-manual-tag request
#[derive(Debug, Clone, Deserialize)]
pub struct ManualTagRequest {
    pub tag: String,
    pub tag_type: TagType,
    pub confidence_score: Option<f64>,
}

/// GitHub repository search parameters
#[derive(Debug, Clone, Deserialize)]
pub struct GithubSearchParams {
    pub language: Option<String>,
    #[serde(default = "default_github_min_stars")]
    pub min_stars: u64,
    #[serde(default = "default_github_max_results")]
    pub max_results: usize,
    pub query: Option<String>,
}

fn default_github_min_stars() -> u64 {
    100
}

fn default_github_max_results() -> usize {
    20
}

/// Repository metadata as reported by GitHub
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GithubRepo {
    pub name: String,
    pub full_name: String,
    pub url: String,
    pub language: Option<String>,
    pub stars: u64,
    pub description: String,
}

/// LLM config update request
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfigUpdate {
    pub provider: Option<String>,
    // base_url intentionally omitted: immutable at runtime to prevent SSRF
    pub chat_model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_method_serializes_to_kebab_case() {
        let json = serde_json::to_value(DetectionMethod::GenerativeAnalysis).unwrap();
        assert_eq!(json, "generative-analysis");
        let json = serde_json::to_value(DetectionMethod::Heuristic).unwrap();
        assert_eq!(json, "heuristic");
    }

    #[test]
    fn test_tag_type_serializes_to_snake_case() {
        let json = serde_json::to_value(TagType::ArchitecturalPattern).unwrap();
        assert_eq!(json, "architectural_pattern");
        let back: TagType = serde_json::from_str("\"design_pattern\"").unwrap();
        assert_eq!(back, TagType::DesignPattern);
    }

    #[test]
    fn test_tag_summary_uses_type_key() {
        let summary = TagSummary {
            tag: "kubernetes".to_string(),
            tag_type: TagType::Infrastructure,
            count: 2,
            avg_confidence: 0.85,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "infrastructure");
        assert!(json.get("tag_type").is_none());
    }

    #[test]
    fn test_search_params_defaults() {
        let params: SearchParams = serde_json::from_str(r#"{"query": "kafka"}"#).unwrap();
        assert_eq!(params.min_confidence, 0.5);
        assert_eq!(params.limit, 20);
    }

    #[test]
    fn test_repository_without_tags_field_loads_empty() {
        let json = r#"{
            "id": "5f0c6f4e-8a51-4b8e-9d55-0d5b3f0a1c2e",
            "name": "svc",
            "full_name": "acme/svc",
            "url": "https://github.com/acme/svc",
            "language": null,
            "stars": 3,
            "description": null,
            "readme_content": null,
            "last_indexed": "2024-01-01T00:00:00Z"
        }"#;
        let repo: Repository = serde_json::from_str(json).unwrap();
        assert!(repo.architecture_tags.is_empty());
    }
}
