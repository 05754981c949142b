use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::analysis::{AnalyzerOptions, ArchitectureAnalyzer};
use crate::config::{Config, LlmConfig};
use crate::github::GithubClient;
use crate::llm::completion::{CompletionTransport, HttpCompletionClient};
use crate::models::{ArchitectureTag, DetectionMethod, Repository};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repos: Arc<RwLock<Vec<Repository>>>,
    pub http_client: reqwest::Client,
    pub llm_config: Arc<RwLock<LlmConfig>>,
    pub github: GithubClient,
    transport: Arc<dyn CompletionTransport>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = build_http_client()?;
        let llm_config = Arc::new(RwLock::new(config.llm.clone()));
        let transport: Arc<dyn CompletionTransport> =
            Arc::new(HttpCompletionClient::new(http_client.clone(), llm_config.clone()));
        Self::assemble(config, http_client, llm_config, transport)
    }

    /// State whose analyzer talks to `transport` instead of a real provider.
    pub fn with_transport(
        config: Config,
        transport: Arc<dyn CompletionTransport>,
    ) -> anyhow::Result<Self> {
        let http_client = build_http_client()?;
        let llm_config = Arc::new(RwLock::new(config.llm.clone()));
        Self::assemble(config, http_client, llm_config, transport)
    }

    fn assemble(
        config: Config,
        http_client: reqwest::Client,
        llm_config: Arc<RwLock<LlmConfig>>,
        transport: Arc<dyn CompletionTransport>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let repos = load_repos(&config.db_path())?;
        tracing::info!("Loaded {} repositories from {}", repos.len(), config.db_path().display());

        let github = GithubClient::new(http_client.clone(), config.github.clone());

        Ok(Self {
            config,
            repos: Arc::new(RwLock::new(repos)),
            http_client,
            llm_config,
            github,
            transport,
        })
    }

    /// Analyzer using the current sampling settings from the live LLM config.
    pub fn analyzer(&self) -> ArchitectureAnalyzer {
        let options = {
            let llm = self.llm_config.read();
            AnalyzerOptions {
                temperature: llm.temperature,
                max_tokens: llm.max_tokens,
            }
        };
        ArchitectureAnalyzer::new(self.transport.clone(), options)
    }

    pub fn find_repo(&self, id: Uuid) -> Option<Repository> {
        self.repos.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn find_by_full_name(&self, full_name: &str) -> Option<Repository> {
        self.repos
            .read()
            .iter()
            .find(|r| r.full_name.eq_ignore_ascii_case(full_name))
            .cloned()
    }

    /// Store a new repository. If one with the same `full_name` already
    /// exists, the stored record is returned and nothing is written.
    ///
    /// The boolean is true when the repository was inserted.
    pub fn insert_repo(&self, repo: Repository) -> anyhow::Result<(Repository, bool)> {
        self.update_repos(|repos| {
            if let Some(existing) = repos
                .iter()
                .find(|r| r.full_name.eq_ignore_ascii_case(&repo.full_name))
            {
                return ((existing.clone(), false), false);
            }
            repos.push(repo.clone());
            ((repo, true), true)
        })
    }

    /// Remove a repository together with its tags. `Ok(false)` if unknown.
    pub fn delete_repo(&self, id: Uuid) -> anyhow::Result<bool> {
        self.update_repos(|repos| {
            let before = repos.len();
            repos.retain(|r| r.id != id);
            let removed = repos.len() != before;
            (removed, removed)
        })
    }

    /// Swap every tag of one detection method for `tags`, keeping the rest.
    pub fn replace_tags(
        &self,
        id: Uuid,
        method: DetectionMethod,
        tags: Vec<ArchitectureTag>,
    ) -> anyhow::Result<Option<Repository>> {
        self.update_repos(|repos| match repos.iter_mut().find(|r| r.id == id) {
            Some(repo) => {
                repo.architecture_tags.retain(|t| t.detection_method != method);
                repo.architecture_tags.extend(tags);
                repo.last_indexed = chrono::Utc::now();
                (Some(repo.clone()), true)
            }
            None => (None, false),
        })
    }

    pub fn add_tag(&self, id: Uuid, tag: ArchitectureTag) -> anyhow::Result<Option<Repository>> {
        self.update_repos(|repos| match repos.iter_mut().find(|r| r.id == id) {
            Some(repo) => {
                repo.architecture_tags.push(tag);
                (Some(repo.clone()), true)
            }
            None => (None, false),
        })
    }

    /// Apply `change` to the repos list and persist it when it reports a
    /// modification. If the write fails the in-memory list is restored, so
    /// memory never runs ahead of disk.
    fn update_repos<T>(
        &self,
        change: impl FnOnce(&mut Vec<Repository>) -> (T, bool),
    ) -> anyhow::Result<T> {
        let mut repos = self.repos.write();
        let previous = repos.clone();
        let (out, modified) = change(&mut repos);
        if modified {
            if let Err(e) = write_repos(&self.config.db_path(), &repos) {
                *repos = previous;
                tracing::error!("Failed to persist repositories: {e:#}");
                return Err(e);
            }
        }
        Ok(out)
    }
}

fn build_http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("arch-search/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()?)
}

/// Read the catalog file. A missing file is an empty catalog; an unreadable
/// one is logged and also treated as empty.
pub fn load_repos(path: &Path) -> anyhow::Result<Vec<Repository>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path)?;
    match serde_json::from_str(&data) {
        Ok(repos) => Ok(repos),
        Err(e) => {
            tracing::warn!("Ignoring unreadable catalog {}: {e}", path.display());
            Ok(Vec::new())
        }
    }
}

/// Persist repos list to disk (atomic write via temp file + rename).
pub fn write_repos(path: &Path, repos: &[Repository]) -> anyhow::Result<()> {
    use anyhow::Context;

    let data = serde_json::to_string_pretty(repos)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &data)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagType;
    use chrono::Utc;

    fn temp_config(dir: &tempfile::TempDir) -> Config {
        Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn repo(full_name: &str) -> Repository {
        let (_, name) = full_name.split_once('/').unwrap();
        Repository {
            id: Uuid::new_v4(),
            name: name.to_string(),
            full_name: full_name.to_string(),
            url: format!("https://github.com/{full_name}"),
            language: Some("Rust".to_string()),
            stars: 42,
            description: None,
            readme_content: Some("# readme".to_string()),
            last_indexed: Utc::now(),
            architecture_tags: Vec::new(),
        }
    }

    fn tag(repo_id: Uuid, name: &str, method: DetectionMethod) -> ArchitectureTag {
        ArchitectureTag {
            repository_id: repo_id,
            tag: name.to_string(),
            tag_type: TagType::ArchitecturalPattern,
            confidence_score: 0.8,
            detection_method: method,
        }
    }

    #[test]
    fn test_full_name_is_unique() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(temp_config(&dir)).unwrap();

        let (first, inserted) = state.insert_repo(repo("acme/shop")).unwrap();
        assert!(inserted);
        let (second, inserted) = state.insert_repo(repo("Acme/Shop")).unwrap();
        assert!(!inserted);
        assert_eq!(first.id, second.id);
        assert_eq!(state.repos.read().len(), 1);
    }

    #[test]
    fn test_delete_cascades_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let state = AppState::new(config.clone()).unwrap();

        let mut r = repo("acme/shop");
        r.architecture_tags.push(tag(r.id, "monolith", DetectionMethod::Heuristic));
        let (stored, _) = state.insert_repo(r).unwrap();

        assert!(state.delete_repo(stored.id).unwrap());
        assert!(!state.delete_repo(stored.id).unwrap());

        let reloaded = load_repos(&config.db_path()).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_replace_tags_keeps_other_methods() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(temp_config(&dir)).unwrap();

        let mut r = repo("acme/shop");
        r.architecture_tags = vec![
            tag(r.id, "microservices", DetectionMethod::Heuristic),
            tag(r.id, "layered", DetectionMethod::GenerativeAnalysis),
            tag(r.id, "hexagonal", DetectionMethod::Manual),
        ];
        let (stored, _) = state.insert_repo(r).unwrap();

        let updated = state
            .replace_tags(
                stored.id,
                DetectionMethod::GenerativeAnalysis,
                vec![tag(stored.id, "cqrs", DetectionMethod::GenerativeAnalysis)],
            )
            .unwrap()
            .unwrap();
        let names: Vec<&str> = updated.architecture_tags.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, vec!["microservices", "hexagonal", "cqrs"]);

        assert!(state
            .replace_tags(Uuid::new_v4(), DetectionMethod::Manual, Vec::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_failed_write_is_reported_and_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let state = AppState::new(config.clone()).unwrap();
        let (stored, _) = state.insert_repo(repo("acme/shop")).unwrap();

        // A directory where the temp file should go makes every write fail.
        std::fs::create_dir(config.db_path().with_extension("json.tmp")).unwrap();

        assert!(state.insert_repo(repo("acme/other")).is_err());
        assert!(state
            .add_tag(stored.id, tag(stored.id, "cqrs", DetectionMethod::Manual))
            .is_err());
        assert!(state.delete_repo(stored.id).is_err());

        let repos = state.repos.read();
        assert_eq!(repos.len(), 1);
        assert!(repos[0].architecture_tags.is_empty());
        drop(repos);
        assert_eq!(load_repos(&config.db_path()).unwrap().len(), 1);

        // Lookups that change nothing don't touch the disk.
        let (existing, inserted) = state.insert_repo(repo("acme/shop")).unwrap();
        assert!(!inserted);
        assert_eq!(existing.id, stored.id);
    }

    #[test]
    fn test_corrupt_catalog_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_repos(&path).unwrap().is_empty());
    }

    #[test]
    fn test_analyzer_follows_live_config() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(temp_config(&dir)).unwrap();
        assert_eq!(state.analyzer().options().max_tokens, 1500);

        state.llm_config.write().max_tokens = 64;
        assert_eq!(state.analyzer().options().max_tokens, 64);
    }
}
