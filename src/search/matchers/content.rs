//! Literal substring search over the raw document snapshot

use super::pattern::located_result;
use super::{MatchContext, Matcher};
use crate::search::types::{SearchResult, SearchType};
use async_trait::async_trait;
use regex::RegexBuilder;
use tracing::debug;

/// Occurrence density ceiling
const MAX_DENSITY: f64 = 10.0;

/// Scores each document by occurrences per thousand bytes of content, capped at 10.
/// The query is matched literally, ignoring case across all scripts.
pub struct ContentMatcher;

#[async_trait]
impl Matcher for ContentMatcher {
    fn search_type(&self) -> SearchType {
        SearchType::Content
    }

    async fn find(&self, ctx: &MatchContext<'_>, query: &str) -> Vec<SearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let re = match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .size_limit(ctx.config.regex_size_limit)
            .build()
        {
            Ok(re) => re,
            Err(e) => {
                debug!("Cannot build content matcher for {:?}: {}", query, e);
                return Vec::new();
            }
        };

        let limit = ctx.config.max_matches_per_result;
        let context = ctx.config.preview_context_chars;
        let mut results = Vec::new();

        for doc in ctx.snapshot().await {
            let mut hits = re.find_iter(&doc.content).map(|m| (m.start(), m.end()));
            let Some(first) = hits.next() else {
                continue;
            };
            let count = 1 + hits.count();
            let density = (count as f64 * 1000.0 / doc.content.len() as f64).min(MAX_DENSITY);
            let mut result = located_result(doc, count, first, &re, limit, context);
            result.relevance_score = density;
            results.push(result);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::search::matchers::test_support::Fixture;

    #[tokio::test]
    async fn test_density_score() {
        let long = format!("{}TODO{}", "x".repeat(998), "y".repeat(998));
        let fx = Fixture::new(vec![
            Document::new("long.txt", long, "text"),
            Document::new("short.txt", "todo: todo", "text"),
        ])
        .await;

        let results = ContentMatcher.find(&fx.ctx(), "todo").await;
        let score = |name: &str| {
            results
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.relevance_score)
                .unwrap()
        };
        assert!((score("long.txt") - 0.5).abs() < 1e-9);
        assert_eq!(score("short.txt"), MAX_DENSITY);
    }

    #[tokio::test]
    async fn test_preview_context_and_highlight() {
        let content = format!("{}needle{}", "a".repeat(80), "b".repeat(80));
        let fx = Fixture::new(vec![Document::new("n.txt", content, "text")]).await;

        let results = ContentMatcher.find(&fx.ctx(), "NEEDLE").await;
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(
            result.preview_snippet,
            format!("...{}needle{}...", "a".repeat(50), "b".repeat(50))
        );
        let (s, e) = result.highlight_ranges[0];
        assert_eq!(&result.preview_snippet[s..e], "needle");
        assert_eq!(result.matches[0].start, 80);
    }

    #[tokio::test]
    async fn test_ignores_case_outside_ascii() {
        let fx = Fixture::new(vec![
            Document::new("ru.txt", "Привет мир", "text"),
            Document::new("de.txt", "STRASSE und Straße", "text"),
        ])
        .await;

        let results = ContentMatcher.find(&fx.ctx(), "привет").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matches[0].text, "Привет");
        let (s, e) = results[0].highlight_ranges[0];
        assert_eq!(&results[0].preview_snippet[s..e], "Привет");

        let results = ContentMatcher.find(&fx.ctx(), "straße").await;
        assert_eq!(results[0].name, "de.txt");
        assert_eq!(results[0].matches.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_match_cap_still_previews() {
        let mut fx = Fixture::new(vec![Document::new("t.txt", "todo: todo", "text")]).await;
        fx.config.max_matches_per_result = 0;

        let results = ContentMatcher.find(&fx.ctx(), "todo").await;
        assert_eq!(results.len(), 1);
        assert!(results[0].matches.is_empty());
        assert_eq!(results[0].relevance_score, MAX_DENSITY);
        assert_eq!(results[0].highlight_ranges.len(), 1);
    }

    #[tokio::test]
    async fn test_literal_not_regex() {
        let fx = Fixture::new(vec![Document::new("r.txt", "a.b axb", "text")]).await;
        let results = ContentMatcher.find(&fx.ctx(), "a.b").await;
        assert_eq!(results[0].matches.len(), 1);
    }
}
