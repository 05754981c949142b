use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the repository catalog is stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Name reported by the health endpoint
    pub app_name: String,
    /// Generative-model provider configuration
    pub llm: LlmConfig,
    /// GitHub API configuration
    pub github: GithubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name used for architecture analysis
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Sampling temperature. Kept low so repeated analyses agree.
    pub temperature: f32,
    /// Upper bound on generated tokens per analysis
    pub max_tokens: u32,
    /// Request timeout in seconds (capped at 300)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Base URL of the GitHub REST API
    pub api_base: String,
    /// Personal access token; unauthenticated requests are heavily rate limited
    pub token: Option<String>,
    /// How many directory levels below the root to list
    pub tree_depth: usize,
    /// Stop listing once this many paths have been collected
    pub max_tree_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:8000".to_string(),
            app_name: "arch-search".to_string(),
            llm: LlmConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o".to_string(),
            api_key: None,
            temperature: 0.3,
            max_tokens: 1500,
            timeout_secs: 120,
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token: None,
            tree_depth: 2,
            max_tree_entries: 500,
        }
    }
}

impl LlmConfig {
    /// Cloud providers refuse requests without a key; local ones don't need it.
    pub fn requires_api_key(&self) -> bool {
        self.provider == "openai"
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("ARCH_SEARCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("ARCH_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(name) = std::env::var("ARCH_SEARCH_APP_NAME") {
            config.app_name = name;
        }

        // LLM config
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(v) = val.parse() {
                config.llm.temperature = v;
            }
        }
        if let Ok(val) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(v) = val.parse() {
                config.llm.max_tokens = v;
            }
        }
        if let Ok(val) = std::env::var("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.llm.timeout_secs = v.min(300);
            }
        }

        // GitHub config
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            config.github.token = Some(token);
        }
        if let Ok(url) = std::env::var("GITHUB_API_BASE") {
            config.github.api_base = url;
        }
        if let Ok(val) = std::env::var("GITHUB_TREE_DEPTH") {
            if let Ok(v) = val.parse() {
                config.github.tree_depth = v;
            }
        }
        if let Ok(val) = std::env::var("GITHUB_MAX_TREE_ENTRIES") {
            if let Ok(v) = val.parse() {
                config.github.max_tree_entries = v;
            }
        }

        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("repos.json")
    }
}
