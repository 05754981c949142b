use crate::models::{Repository, TagSummary, TagType};

/// Aggregate every stored tag into one row per (tag, type), in first-seen order.
pub fn summarize(repositories: &[Repository], tag_type: Option<TagType>) -> Vec<TagSummary> {
    let mut summaries: Vec<TagSummary> = Vec::new();

    let tags = repositories
        .iter()
        .flat_map(|r| r.architecture_tags.iter())
        .filter(|t| tag_type.map_or(true, |wanted| t.tag_type == wanted));

    for tag in tags {
        match summaries
            .iter_mut()
            .find(|s| s.tag == tag.tag && s.tag_type == tag.tag_type)
        {
            Some(summary) => {
                summary.count += 1;
                summary.avg_confidence += tag.confidence_score;
            }
            None => summaries.push(TagSummary {
                tag: tag.tag.clone(),
                tag_type: tag.tag_type,
                count: 1,
                avg_confidence: tag.confidence_score,
            }),
        }
    }

    // running sums -> means
    for summary in &mut summaries {
        summary.avg_confidence /= summary.count as f64;
    }
    summaries
}
