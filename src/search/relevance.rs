use crate::models::{RankedRepository, Repository};

/// Bonus when the repository language equals a query term.
pub const LANGUAGE_BONUS: f64 = 0.5;
/// Bonus per query term found in the repository description.
pub const DESCRIPTION_BONUS: f64 = 0.2;

/// Scoring knobs supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct ScoreOptions {
    /// Tags below this confidence are ignored.
    pub min_confidence: f64,
    /// Maximum number of results returned.
    pub limit: usize,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            limit: 20,
        }
    }
}

/// Additive relevance ranking of repositories against a free-text query.
///
/// Scoring per repository:
/// 1. Every tag at or above `min_confidence` whose name contains a query term,
///    or is contained in one, adds its confidence. Each such (tag, term) match
///    is listed in `matched_tags`, so a name can appear more than once.
/// 2. A language equal to a term (case-insensitive) adds [`LANGUAGE_BONUS`].
/// 3. Every term found in the description adds [`DESCRIPTION_BONUS`].
///
/// Repositories scoring zero are dropped. The rest are sorted by score
/// descending with ties kept in input order, then cut to `limit`.
pub fn score(query: &str, repositories: &[Repository], options: &ScoreOptions) -> Vec<RankedRepository> {
    let terms = query_terms(query);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<RankedRepository> = repositories
        .iter()
        .filter_map(|repo| {
            let (relevance_score, matched_tags) = score_repository(&terms, repo, options.min_confidence);
            (relevance_score > 0.0).then(|| RankedRepository {
                repository: repo.clone(),
                relevance_score,
                matched_tags,
            })
        })
        .collect();

    // sort_by is stable, so equal scores keep input order
    results.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(options.limit);
    results
}

/// Lower-cased whitespace-separated terms, duplicates dropped, first occurrence kept.
fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in query.to_lowercase().split_whitespace() {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

fn score_repository(terms: &[String], repo: &Repository, min_confidence: f64) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut matched_tags: Vec<String> = Vec::new();

    for tag in &repo.architecture_tags {
        if tag.confidence_score < min_confidence {
            continue;
        }
        let tag_lower = tag.tag.to_lowercase();
        for term in terms {
            if tag_lower.contains(term.as_str()) || term.contains(tag_lower.as_str()) {
                score += tag.confidence_score;
                matched_tags.push(tag.tag.clone());
            }
        }
    }

    if let Some(language) = &repo.language {
        let language = language.to_lowercase();
        if terms.iter().any(|t| *t == language) {
            score += LANGUAGE_BONUS;
        }
    }

    if let Some(description) = &repo.description {
        let description = description.to_lowercase();
        for term in terms {
            if description.contains(term.as_str()) {
                score += DESCRIPTION_BONUS;
            }
        }
    }

    (score, matched_tags)
}
