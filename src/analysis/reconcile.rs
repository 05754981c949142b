use std::collections::BTreeMap;

use uuid::Uuid;

use crate::models::{AnalysisResult, ArchitectureTag, DetectionMethod, TagType};

use super::heuristics::tag_type_for;

/// Turn detector outputs into the tag rows stored for a repository.
///
/// Every candidate becomes its own tag. Nothing is merged, renormalized or
/// deduplicated, even when both detectors name the same pattern: each row
/// keeps its own provenance. Order is architectural patterns, design
/// patterns, infrastructure, frameworks, then heuristics.
pub fn reconcile(
    repository_id: Uuid,
    analysis: Option<&AnalysisResult>,
    heuristics: Option<&BTreeMap<String, f64>>,
) -> Vec<ArchitectureTag> {
    let mut tags = Vec::new();

    if let Some(analysis) = analysis {
        let generative = |tag: &str, tag_type: TagType, confidence_score: f64| ArchitectureTag {
            repository_id,
            tag: tag.to_string(),
            tag_type,
            confidence_score,
            detection_method: DetectionMethod::GenerativeAnalysis,
        };

        for p in &analysis.architectural_patterns {
            tags.push(generative(&p.name, TagType::ArchitecturalPattern, p.confidence));
        }
        for p in &analysis.design_patterns {
            tags.push(generative(&p.name, TagType::DesignPattern, p.confidence));
        }
        for infra in &analysis.infrastructure {
            tags.push(generative(&infra.approach, TagType::Infrastructure, infra.confidence));
        }
        // frameworks are recorded at full confidence
        for framework in &analysis.frameworks {
            tags.push(generative(framework, TagType::Framework, 1.0));
        }
    }

    if let Some(heuristics) = heuristics {
        for (pattern, confidence) in heuristics {
            tags.push(ArchitectureTag {
                repository_id,
                tag: pattern.clone(),
                tag_type: tag_type_for(pattern),
                confidence_score: *confidence,
                detection_method: DetectionMethod::Heuristic,
            });
        }
    }

    tags
}

/// Build a manually curated tag. Confidence defaults to 1.0.
///
/// Returns `None` for a blank tag or a confidence outside [0, 1].
pub fn manual_tag(
    repository_id: Uuid,
    tag: &str,
    tag_type: TagType,
    confidence: Option<f64>,
) -> Option<ArchitectureTag> {
    let tag = tag.trim();
    let confidence_score = confidence.unwrap_or(1.0);
    if tag.is_empty() || !(0.0..=1.0).contains(&confidence_score) {
        return None;
    }
    Some(ArchitectureTag {
        repository_id,
        tag: tag.to_string(),
        tag_type,
        confidence_score,
        detection_method: DetectionMethod::Manual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InfrastructureCandidate, PatternCandidate};

    fn sample_analysis() -> AnalysisResult {
        AnalysisResult {
            architectural_patterns: vec![
                PatternCandidate {
                    name: "microservices".to_string(),
                    confidence: 0.8,
                },
                PatternCandidate {
                    name: "event-driven".to_string(),
                    confidence: 0.55,
                },
            ],
            design_patterns: vec![PatternCandidate {
                name: "repository".to_string(),
                confidence: 0.4,
            }],
            infrastructure: vec![InfrastructureCandidate {
                approach: "microservices".to_string(),
                confidence: 0.3,
            }],
            frameworks: vec!["Django".to_string(), "Celery".to_string()],
            summary: "Django services talking over Celery queues.".to_string(),
        }
    }

    fn sample_heuristics() -> BTreeMap<String, f64> {
        let mut h = BTreeMap::new();
        h.insert("microservices".to_string(), 0.7);
        h.insert("containerized".to_string(), 0.9);
        h
    }

    #[test]
    fn test_both_absent_yields_no_tags() {
        assert!(reconcile(Uuid::new_v4(), None, None).is_empty());
    }

    #[test]
    fn test_tag_count_equals_sum_of_inputs() {
        let analysis = sample_analysis();
        let heuristics = sample_heuristics();
        let tags = reconcile(Uuid::new_v4(), Some(&analysis), Some(&heuristics));

        let expected = analysis.architectural_patterns.len()
            + analysis.design_patterns.len()
            + analysis.infrastructure.len()
            + analysis.frameworks.len()
            + heuristics.len();
        assert_eq!(tags.len(), expected);
    }

    #[test]
    fn test_confidences_pass_through_unchanged() {
        let analysis = sample_analysis();
        let tags = reconcile(Uuid::new_v4(), Some(&analysis), None);

        let scores: Vec<f64> = tags.iter().map(|t| t.confidence_score).collect();
        assert_eq!(scores, vec![0.8, 0.55, 0.4, 0.3, 1.0, 1.0]);
        assert!(tags
            .iter()
            .all(|t| t.detection_method == DetectionMethod::GenerativeAnalysis));
    }

    #[test]
    fn test_tag_types_follow_sections() {
        let tags = reconcile(Uuid::new_v4(), Some(&sample_analysis()), None);
        let types: Vec<TagType> = tags.iter().map(|t| t.tag_type).collect();
        assert_eq!(
            types,
            vec![
                TagType::ArchitecturalPattern,
                TagType::ArchitecturalPattern,
                TagType::DesignPattern,
                TagType::Infrastructure,
                TagType::Framework,
                TagType::Framework,
            ]
        );
    }

    #[test]
    fn test_same_pattern_from_both_sources_is_kept_twice() {
        let analysis = sample_analysis();
        let heuristics = sample_heuristics();
        let tags = reconcile(Uuid::new_v4(), Some(&analysis), Some(&heuristics));

        let micro: Vec<&ArchitectureTag> =
            tags.iter().filter(|t| t.tag == "microservices").collect();
        // architectural pattern + infrastructure from analysis, one heuristic
        assert_eq!(micro.len(), 3);
        assert!(micro
            .iter()
            .any(|t| t.detection_method == DetectionMethod::Heuristic && t.confidence_score == 0.7));
    }

    #[test]
    fn test_heuristic_tags_use_rule_tag_types() {
        let id = Uuid::new_v4();
        let tags = reconcile(id, None, Some(&sample_heuristics()));
        assert_eq!(tags.len(), 2);
        // BTreeMap order
        assert_eq!(tags[0].tag, "containerized");
        assert_eq!(tags[0].tag_type, TagType::Infrastructure);
        assert_eq!(tags[1].tag, "microservices");
        assert_eq!(tags[1].tag_type, TagType::ArchitecturalPattern);
        assert!(tags.iter().all(|t| t.repository_id == id));
    }

    #[test]
    fn test_manual_tag_defaults_to_full_confidence() {
        let tag = manual_tag(Uuid::new_v4(), " hexagonal ", TagType::ArchitecturalPattern, None)
            .unwrap();
        assert_eq!(tag.tag, "hexagonal");
        assert_eq!(tag.confidence_score, 1.0);
        assert_eq!(tag.detection_method, DetectionMethod::Manual);
    }

    #[test]
    fn test_manual_tag_rejects_bad_input() {
        let id = Uuid::new_v4();
        assert!(manual_tag(id, "", TagType::Framework, None).is_none());
        assert!(manual_tag(id, "axum", TagType::Framework, Some(1.2)).is_none());
        assert!(manual_tag(id, "axum", TagType::Framework, Some(0.4)).is_some());
    }
}
