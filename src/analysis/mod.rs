//! Architecture classification: heuristic detection, generative analysis and
//! reconciliation of both into stored tags.

pub mod analyzer;
pub mod heuristics;
pub mod reconcile;

use thiserror::Error;

use crate::models::{AnalysisResult, ArchitectureTag, RepositorySnapshot};

pub use analyzer::{AnalyzerOptions, ArchitectureAnalyzer};
pub use reconcile::{manual_tag, reconcile};

/// Why a generative analysis produced no result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The model answered, but not in the required shape.
    #[error("analysis response failed validation: {0}")]
    Validation(String),
    /// The model could not be reached or refused the call.
    #[error("analysis call failed: {0}")]
    Transport(String),
}

impl AnalysisError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalysisError::Validation(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AnalysisError::Transport(_))
    }
}

/// Tags for one repository plus the generative result they came from, if any.
#[derive(Debug, Clone)]
pub struct Classification {
    pub tags: Vec<ArchitectureTag>,
    pub analysis: Option<AnalysisResult>,
}

/// Classify a repository snapshot.
///
/// Heuristics always run on the file paths. The analyzer runs only when one
/// is given and the snapshot has README text; its failure fails the call.
pub async fn classify(
    snapshot: &RepositorySnapshot,
    analyzer: Option<&ArchitectureAnalyzer>,
) -> Result<Classification, AnalysisError> {
    let heuristics = heuristics::detect(&snapshot.file_paths);

    let readme = snapshot
        .readme_text
        .as_deref()
        .filter(|r| !r.trim().is_empty());

    let analysis = match (analyzer, readme) {
        (Some(analyzer), Some(readme)) => Some(
            analyzer
                .analyze(readme, &snapshot.full_name, Some(snapshot.file_paths.as_slice()))
                .await?,
        ),
        _ => None,
    };

    let tags = reconcile(snapshot.id, analysis.as_ref(), Some(&heuristics));
    Ok(Classification { tags, analysis })
}
