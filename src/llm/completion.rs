use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// One JSON-mode chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text-generation backend used by the architecture analyzer.
///
/// Implementations own auth, timeouts and any retry policy; the analyzer only
/// sees the raw completion text or a single opaque failure.
#[async_trait::async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// HTTP transport for Ollama and OpenAI-compatible chat APIs.
///
/// Reads the provider settings on every call, so runtime config updates
/// take effect immediately.
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    config: Arc<RwLock<LlmConfig>>,
}

impl HttpCompletionClient {
    pub fn new(client: reqwest::Client, config: Arc<RwLock<LlmConfig>>) -> Self {
        Self { client, config }
    }
}

#[async_trait::async_trait]
impl CompletionTransport for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let config = self.config.read().clone();
        match config.provider.as_str() {
            "ollama" => call_ollama(&self.client, &config, request).await,
            "openai" => call_openai(&self.client, &config, request).await,
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        }
    }
}

fn request_timeout(config: &LlmConfig) -> Duration {
    Duration::from_secs(config.timeout_secs.min(300))
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

async fn call_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    request: &CompletionRequest,
) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url.trim_end_matches('/'));

    let req = OllamaChatRequest {
        model: config.chat_model.clone(),
        messages: chat_messages(request),
        stream: false,
        format: "json",
        options: OllamaOptions {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        },
    };

    let resp = client
        .post(&url)
        .timeout(request_timeout(config))
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama chat API for architecture analysis")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama chat response")?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    response_format: ResponseFormat,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    request: &CompletionRequest,
) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/'));
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.chat_model.clone(),
        messages: chat_messages(request),
        response_format: ResponseFormat {
            kind: "json_object",
        },
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    };

    let resp = client
        .post(&url)
        .timeout(request_timeout(config))
        .bearer_auth(api_key)
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI chat API for architecture analysis")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp
        .json()
        .await
        .context("Failed to parse OpenAI chat response")?;
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("OpenAI chat API returned no content")
}

fn chat_messages(request: &CompletionRequest) -> Vec<Message> {
    vec![
        Message {
            role: "system".to_string(),
            content: request.system.clone(),
        },
        Message {
            role: "user".to_string(),
            content: request.user.clone(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> CompletionRequest {
        CompletionRequest {
            system: "be an architect".to_string(),
            user: "classify this".to_string(),
            temperature: 0.3,
            max_tokens: 1500,
        }
    }

    #[test]
    fn test_openai_request_uses_json_object_mode() {
        let req = OpenAiChatRequest {
            model: "gpt-4o".to_string(),
            messages: chat_messages(&sample_request()),
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.3,
            max_tokens: 1500,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["max_tokens"], 1500);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "classify this");
    }

    #[test]
    fn test_ollama_request_carries_sampling_options() {
        let req = OllamaChatRequest {
            model: "llama3.2".to_string(),
            messages: chat_messages(&sample_request()),
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: 0.3,
                num_predict: 1500,
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["format"], "json");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 1500);
    }

    #[test]
    fn test_timeout_is_capped() {
        let config = LlmConfig {
            timeout_secs: 10_000,
            ..LlmConfig::default()
        };
        assert_eq!(request_timeout(&config), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_an_error() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..LlmConfig::default()
        };
        let transport =
            HttpCompletionClient::new(reqwest::Client::new(), Arc::new(RwLock::new(config)));
        let err = transport.complete(&sample_request()).await.unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
