//! Rule-based pattern detection from a repository's file layout.
//!
//! Every rule carries a fixed confidence. Rules never stack: a pattern is
//! either present once or absent.

use std::collections::BTreeMap;

use crate::models::TagType;

/// How a rule inspects the path list.
enum Signal {
    /// Any needle is a substring of the joined, lower-cased path list.
    AnyInJoined(&'static [&'static str]),
    /// Every needle is a substring of the joined, lower-cased path list.
    AllInJoined(&'static [&'static str]),
    /// Some individual lower-cased path contains one of the needles.
    AnyInPath(&'static [&'static str]),
    /// Some lower-cased path equals one of the names exactly.
    ExactPath(&'static [&'static str]),
}

struct Rule {
    pattern: &'static str,
    tag_type: TagType,
    confidence: f64,
    signal: Signal,
}

const RULES: &[Rule] = &[
    Rule {
        pattern: "microservices",
        tag_type: TagType::ArchitecturalPattern,
        confidence: 0.70,
        signal: Signal::AnyInJoined(&["services/", "microservices/", "api-gateway"]),
    },
    Rule {
        pattern: "event-driven",
        tag_type: TagType::ArchitecturalPattern,
        confidence: 0.60,
        signal: Signal::AnyInJoined(&["kafka", "rabbitmq", "event", "message", "queue"]),
    },
    Rule {
        pattern: "containerized",
        tag_type: TagType::Infrastructure,
        confidence: 0.90,
        signal: Signal::ExactPath(&["dockerfile", "docker-compose.yml"]),
    },
    Rule {
        pattern: "kubernetes",
        tag_type: TagType::Infrastructure,
        confidence: 0.85,
        signal: Signal::AnyInPath(&["kubernetes", "k8s", "helm"]),
    },
    Rule {
        pattern: "clean-architecture",
        tag_type: TagType::ArchitecturalPattern,
        confidence: 0.70,
        signal: Signal::AllInJoined(&["domain", "application", "infrastructure"]),
    },
    Rule {
        pattern: "serverless",
        tag_type: TagType::ArchitecturalPattern,
        confidence: 0.75,
        signal: Signal::AnyInJoined(&["serverless", "lambda", "functions/"]),
    },
];

/// Detect architecture patterns from a list of repository file paths.
///
/// Returns pattern name -> confidence. Empty input gives an empty map.
/// The map iterates alphabetically by pattern name, not in rule order, so
/// heuristic tags are stored in that order.
pub fn detect<S: AsRef<str>>(file_paths: &[S]) -> BTreeMap<String, f64> {
    let mut patterns = BTreeMap::new();
    if file_paths.is_empty() {
        return patterns;
    }

    let lowered: Vec<String> = file_paths
        .iter()
        .map(|p| p.as_ref().to_lowercase())
        .collect();
    let joined = lowered.join(" ");

    for rule in RULES {
        let hit = match rule.signal {
            Signal::AnyInJoined(needles) => needles.iter().any(|n| joined.contains(n)),
            Signal::AllInJoined(needles) => needles.iter().all(|n| joined.contains(n)),
            Signal::AnyInPath(needles) => lowered
                .iter()
                .any(|path| needles.iter().any(|n| path.contains(n))),
            Signal::ExactPath(names) => lowered.iter().any(|path| names.contains(&path.as_str())),
        };
        if hit {
            patterns.insert(rule.pattern.to_string(), rule.confidence);
        }
    }

    patterns
}

/// Tag type a heuristic pattern is stored under. Names outside the rule
/// table are treated as architectural patterns.
pub fn tag_type_for(pattern: &str) -> TagType {
    RULES
        .iter()
        .find(|r| r.pattern.eq_ignore_ascii_case(pattern))
        .map(|r| r.tag_type)
        .unwrap_or(TagType::ArchitecturalPattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input_yields_empty_map() {
        let empty: Vec<String> = Vec::new();
        assert!(detect(&empty).is_empty());
    }

    #[test]
    fn test_docker_k8s_clean_architecture_layout() {
        let files = paths(&[
            "Dockerfile",
            "k8s/deployment.yaml",
            "src/domain/x.py",
            "src/application/y.py",
            "src/infrastructure/z.py",
        ]);
        let result = detect(&files);

        let mut expected = BTreeMap::new();
        expected.insert("containerized".to_string(), 0.90);
        expected.insert("kubernetes".to_string(), 0.85);
        expected.insert("clean-architecture".to_string(), 0.70);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_detect_is_deterministic() {
        let files = paths(&["services/orders/main.go", "deploy/helm/values.yaml", "queue.rs"]);
        assert_eq!(detect(&files), detect(&files));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let files = paths(&["Services/Billing/App.java", "Deploy/HELM/Chart.yaml"]);
        let result = detect(&files);
        assert_eq!(result.get("microservices"), Some(&0.70));
        assert_eq!(result.get("kubernetes"), Some(&0.85));
    }

    #[test]
    fn test_rules_do_not_stack() {
        // Several event-driven signals still produce one entry at the fixed weight.
        let files = paths(&["kafka/consumer.py", "rabbitmq/publisher.py", "events/bus.py"]);
        let result = detect(&files);
        assert_eq!(result.len(), 1);
        assert_eq!(result["event-driven"], 0.60);
    }

    #[test]
    fn test_nested_dockerfile_is_not_an_exact_match() {
        let files = paths(&["docker/Dockerfile"]);
        assert!(!detect(&files).contains_key("containerized"));

        let files = paths(&["docker-compose.yml"]);
        assert_eq!(detect(&files)["containerized"], 0.90);
    }

    #[test]
    fn test_clean_architecture_needs_all_three_layers() {
        let files = paths(&["src/domain/user.rs", "src/application/service.rs"]);
        assert!(!detect(&files).contains_key("clean-architecture"));
    }

    #[test]
    fn test_serverless_signals() {
        for p in ["serverless.yml", "lambda/handler.py", "netlify/functions/hello.js"] {
            let result = detect(&[p]);
            assert_eq!(result.get("serverless"), Some(&0.75), "path {p}");
        }
    }

    #[test]
    fn test_all_rules_can_fire_together() {
        let files = paths(&[
            "Dockerfile",
            "services/api-gateway/main.go",
            "kafka/topics.yaml",
            "charts/helm/values.yaml",
            "domain/application/infrastructure.md",
            "functions/resize.ts",
        ]);
        assert_eq!(detect(&files).len(), 6);
    }

    #[test]
    fn test_patterns_iterate_alphabetically() {
        // rule order would put microservices before containerized
        let files = paths(&["Dockerfile", "services/lambda/handler.py"]);
        let names: Vec<String> = detect(&files).into_keys().collect();
        assert_eq!(names, vec!["containerized", "microservices", "serverless"]);
    }

    #[test]
    fn test_tag_type_for_known_and_unknown_patterns() {
        assert_eq!(tag_type_for("containerized"), TagType::Infrastructure);
        assert_eq!(tag_type_for("Kubernetes"), TagType::Infrastructure);
        assert_eq!(tag_type_for("serverless"), TagType::ArchitecturalPattern);
        assert_eq!(tag_type_for("something-else"), TagType::ArchitecturalPattern);
    }
}
