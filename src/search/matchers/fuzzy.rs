//! Approximate search over names, content and tags

use super::{MatchContext, Matcher};
use crate::search::fuzzy::FuzzyMatcher;
use crate::search::preview;
use crate::search::types::{SearchResult, SearchType};
use async_trait::async_trait;

/// Best partial ratio across name, content and joined tags, divided by 100.
/// Documents under the configured floor are dropped.
pub struct FuzzyTextMatcher;

#[async_trait]
impl Matcher for FuzzyTextMatcher {
    fn search_type(&self) -> SearchType {
        SearchType::Fuzzy
    }

    async fn find(&self, ctx: &MatchContext<'_>, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = FuzzyMatcher::with_threshold(ctx.config.fuzzy_threshold);
        let width = ctx.config.preview_context_chars * 2;

        ctx.snapshot()
            .await
            .into_iter()
            .filter_map(|doc| {
                let similarity = [
                    matcher.partial_ratio(query, &doc.name),
                    matcher.partial_ratio(query, &doc.content),
                    matcher.partial_ratio(query, &doc.tags.join(" ")),
                ]
                .into_iter()
                .fold(0.0f64, f64::max);

                if !matcher.passes(similarity) {
                    return None;
                }

                let mut result = SearchResult::from_document(doc, similarity / 100.0);
                result.preview_snippet = preview::leading(&result.content, width).text;
                Some(result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::search::matchers::test_support::Fixture;

    async fn fixture() -> Fixture {
        Fixture::new(vec![
            Document::new("a.py", "def foo(): pass", "python"),
            Document::new("c.txt", "shopping list", "text"),
            Document::new("d.md", "notes", "markdown").with_tags(["football"]),
        ])
        .await
    }

    #[tokio::test]
    async fn test_floor_excludes_unrelated() {
        let fx = fixture().await;
        let results = FuzzyTextMatcher.find(&fx.ctx(), "fo").await;
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();

        assert!(names.contains(&"a.py"));
        assert!(!names.contains(&"c.txt"));
        assert!(results.iter().all(|r| r.relevance_score >= 0.6));
    }

    #[tokio::test]
    async fn test_tags_are_searched() {
        let fx = fixture().await;
        let results = FuzzyTextMatcher.find(&fx.ctx(), "footbal").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "d.md");
        assert_eq!(results[0].relevance_score, 1.0);
    }

    #[tokio::test]
    async fn test_name_similarity() {
        let fx = fixture().await;
        let results = FuzzyTextMatcher.find(&fx.ctx(), "c.txt").await;
        assert!(results.iter().any(|r| r.name == "c.txt" && r.relevance_score == 1.0));
    }
}
