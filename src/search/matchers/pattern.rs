//! Regular-expression search over the raw document snapshot

use super::{text_match, MatchContext, Matcher};
use crate::analysis::LineIndex;
use crate::document::Document;
use crate::search::preview;
use crate::search::types::{SearchResult, SearchType};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Scores each document by its number of matches. Patterns are case-insensitive and
/// multi-line; one that fails to compile yields no results.
pub struct RegexMatcher;

#[async_trait]
impl Matcher for RegexMatcher {
    fn search_type(&self) -> SearchType {
        SearchType::Regex
    }

    async fn find(&self, ctx: &MatchContext<'_>, query: &str) -> Vec<SearchResult> {
        let re = match RegexBuilder::new(query)
            .case_insensitive(true)
            .multi_line(true)
            .size_limit(ctx.config.regex_size_limit)
            .build()
        {
            Ok(re) => re,
            Err(e) => {
                debug!("Invalid regex {:?}: {}", query, e);
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
            results.push(located_result(doc, count, first, &re, limit, context));
        }

        results
    }
}

/// Result scored by `count`, recording up to `limit` matches of `re` and previewing `first`
pub(crate) fn located_result(
    doc: Document,
    count: usize,
    first: (usize, usize),
    re: &Regex,
    limit: usize,
    context: usize,
) -> SearchResult {
    let lines = LineIndex::new(&doc.content);
    let matches = re
        .find_iter(&doc.content)
        .take(limit)
        .map(|m| text_match(&doc.content, &lines, m.start(), m.end()))
        .collect();

    let snippet = preview::around(&doc.content, first.0, first.1, context);
    let mut result = SearchResult::from_document(doc, count as f64);
    result.matches = matches;
    result.preview_snippet = snippet.text;
    result.highlight_ranges = snippet.highlights;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::matchers::test_support::Fixture;

    async fn fixture() -> Fixture {
        Fixture::new(vec![
            Document::new("a.py", "def foo(): pass\nDEF bar(): pass", "python"),
            Document::new("b.txt", "nothing to see", "text"),
        ])
        .await
    }

    #[tokio::test]
    async fn test_counts_matches_case_insensitively() {
        let fx = fixture().await;
        let results = RegexMatcher.find(&fx.ctx(), r"^def \w+").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relevance_score, 2.0);
        assert_eq!(results[0].matches[1].text, "DEF bar");
        assert_eq!(results[0].matches[1].line, 2);
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_empty() {
        let fx = fixture().await;
        assert!(RegexMatcher.find(&fx.ctx(), "(").await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_match_cap_still_previews() {
        let mut fx = fixture().await;
        fx.config.max_matches_per_result = 0;

        let results = RegexMatcher.find(&fx.ctx(), "foo").await;
        assert_eq!(results.len(), 1);
        assert!(results[0].matches.is_empty());
        assert_eq!(results[0].relevance_score, 1.0);
        let (s, e) = results[0].highlight_ranges[0];
        assert_eq!(&results[0].preview_snippet[s..e], "foo");
    }

    #[tokio::test]
    async fn test_matches_capped() {
        let content = "x ".repeat(30);
        let fx = Fixture::new(vec![Document::new("x.txt", content, "text")]).await;
        let results = RegexMatcher.find(&fx.ctx(), "x").await;
        assert_eq!(results[0].relevance_score, 30.0);
        assert_eq!(results[0].matches.len(), fx.config.max_matches_per_result);
    }
}
