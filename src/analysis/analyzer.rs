use std::sync::Arc;

use crate::llm::completion::{CompletionRequest, CompletionTransport};
use crate::models::AnalysisResult;

use super::AnalysisError;

/// File-tree entries included in the prompt context.
pub const MAX_FILE_TREE_ENTRIES: usize = 100;
/// README characters included in the prompt context.
pub const MAX_README_CHARS: usize = 8000;

const SYSTEM_PROMPT: &str = "You are an expert software architect. Analyze repositories and return structured JSON.\n\
Your task is to identify architectural patterns, design patterns, infrastructure approaches, and frameworks used.\n\
Be specific and provide confidence scores between 0.0 and 1.0 based on evidence found.";

/// Sampling parameters for one analysis request.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 1500,
        }
    }
}

/// Classifies a repository through a generative model under a fixed schema.
///
/// Holds no per-call state; share one instance across tasks.
#[derive(Clone)]
pub struct ArchitectureAnalyzer {
    transport: Arc<dyn CompletionTransport>,
    options: AnalyzerOptions,
}

impl ArchitectureAnalyzer {
    pub fn new(transport: Arc<dyn CompletionTransport>, options: AnalyzerOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> AnalyzerOptions {
        self.options
    }

    /// Run one analysis. Either the whole response validates or the call fails.
    pub async fn analyze(
        &self,
        readme_text: &str,
        repository_name: &str,
        file_tree: Option<&[String]>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let context = build_context(readme_text, repository_name, file_tree);
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: build_user_prompt(&context),
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        let raw = self
            .transport
            .complete(&request)
            .await
            .map_err(|e| AnalysisError::Transport(format!("{e:#}")))?;

        let result = parse_analysis(&raw)?;
        tracing::info!(
            "Analyzed {repository_name}: {} architectural, {} design, {} infrastructure, {} frameworks",
            result.architectural_patterns.len(),
            result.design_patterns.len(),
            result.infrastructure.len(),
            result.frameworks.len()
        );
        Ok(result)
    }
}

/// Build the bounded repository context sent to the model.
pub fn build_context(readme_text: &str, repository_name: &str, file_tree: Option<&[String]>) -> String {
    let mut context = format!("Repository: {repository_name}\n\n");

    if let Some(tree) = file_tree.filter(|t| !t.is_empty()) {
        let shown = &tree[..tree.len().min(MAX_FILE_TREE_ENTRIES)];
        context.push_str("File Structure:\n");
        context.push_str(&shown.join("\n"));
        context.push_str("\n\n");
    }

    context.push_str("README Content:\n");
    context.push_str(truncate_chars(readme_text, MAX_README_CHARS));
    context
}

fn build_user_prompt(context: &str) -> String {
    format!(
        "Analyze this repository and identify:\n\
         - Architectural patterns (microservices, monolith, serverless, event-driven, hexagonal, clean architecture, etc.)\n\
         - Design patterns mentioned or evident (repository pattern, factory, singleton, observer, etc.)\n\
         - Infrastructure approach (containerized, cloud-native, kubernetes, serverless, etc.)\n\
         - Notable frameworks or libraries\n\n\
         Return JSON with this exact structure:\n\
         {{\n\
         \x20   \"architectural_patterns\": [{{\"name\": \"pattern name\", \"confidence\": 0.0-1.0}}],\n\
         \x20   \"design_patterns\": [{{\"name\": \"pattern name\", \"confidence\": 0.0-1.0}}],\n\
         \x20   \"infrastructure\": [{{\"approach\": \"approach name\", \"confidence\": 0.0-1.0}}],\n\
         \x20   \"frameworks\": [\"framework1\", \"framework2\"],\n\
         \x20   \"summary\": \"Brief 1-2 sentence summary of the architecture\"\n\
         }}\n\n\
         {context}"
    )
}

/// Truncate to at most `max_chars` characters without splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Parse and validate a raw model response.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let result: AnalysisResult = serde_json::from_str(raw.trim()).map_err(|e| {
        tracing::warn!("Analysis response does not match schema: {e}");
        AnalysisError::Validation(format!("response does not match the analysis schema: {e}"))
    })?;
    validate(&result)?;
    Ok(result)
}

fn validate(result: &AnalysisResult) -> Result<(), AnalysisError> {
    let named = result
        .architectural_patterns
        .iter()
        .map(|p| ("architectural_patterns", p.name.as_str(), p.confidence))
        .chain(
            result
                .design_patterns
                .iter()
                .map(|p| ("design_patterns", p.name.as_str(), p.confidence)),
        )
        .chain(
            result
                .infrastructure
                .iter()
                .map(|i| ("infrastructure", i.approach.as_str(), i.confidence)),
        );

    for (section, name, confidence) in named {
        if name.trim().is_empty() {
            return Err(AnalysisError::Validation(format!(
                "{section} contains an entry with a blank name"
            )));
        }
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(AnalysisError::Validation(format!(
                "{section} entry '{name}' has confidence {confidence} outside [0, 1]"
            )));
        }
    }

    if result.frameworks.iter().any(|f| f.trim().is_empty()) {
        return Err(AnalysisError::Validation(
            "frameworks contains a blank name".to_string(),
        ));
    }

    Ok(())
}
