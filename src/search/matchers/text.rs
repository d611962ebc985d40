//! Token search over the inverted index

use super::{text_match, MatchContext, Matcher};
use crate::analysis::LineIndex;
use crate::document::DocumentKey;
use crate::index::tokenize::{index_terms, word_spans};
use crate::search::preview;
use crate::search::types::{SearchResult, SearchType, TextMatch};
use async_trait::async_trait;
use std::collections::HashMap;

const EXACT_HIT: f64 = 2.0;
const PARTIAL_HIT: f64 = 1.0;

/// Exact token hits score 2.0 per document, tokens merely containing a query term score 1.0
pub struct TextMatcher;

#[async_trait]
impl Matcher for TextMatcher {
    fn search_type(&self) -> SearchType {
        SearchType::Text
    }

    async fn find(&self, ctx: &MatchContext<'_>, query: &str) -> Vec<SearchResult> {
        let terms = index_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scores: HashMap<DocumentKey, f64> = HashMap::new();
        for term in &terms {
            if let Some(keys) = ctx.index.tokens().get(term) {
                for key in keys {
                    *scores.entry(key.clone()).or_default() += EXACT_HIT;
                }
            }

            // TODO: contains scan is linear in vocabulary size; index token n-grams to bound it
            for (token, keys) in ctx.index.tokens() {
                if token != term && token.contains(term.as_str()) {
                    for key in keys {
                        *scores.entry(key.clone()).or_default() += PARTIAL_HIT;
                    }
                }
            }
        }

        let limit = ctx.config.max_matches_per_result;
        let context = ctx.config.preview_context_chars;

        ctx.resolve_scored(scores)
            .await
            .into_iter()
            .map(|(doc, score)| {
                let matches = term_matches(&doc.content, &terms, limit);
                let mut result = SearchResult::from_document(doc, score);

                let mut snippet = match matches.first() {
                    Some(first) => preview::around(&result.content, first.start, first.end, context),
                    None => preview::leading(&result.content, context * 2),
                };
                snippet.highlights = preview::term_ranges(&snippet.text, &terms);

                result.matches = matches;
                result.preview_snippet = snippet.text;
                result.highlight_ranges = snippet.highlights;
                result
            })
            .collect()
    }
}

/// Words of `content` containing any term, in document order
fn term_matches(content: &str, terms: &[String], limit: usize) -> Vec<TextMatch> {
    let lines = LineIndex::new(content);
    word_spans(content)
        .into_iter()
        .filter(|&(s, e)| {
            let word = content[s..e].to_lowercase();
            terms.iter().any(|t| word.contains(t.as_str()))
        })
        .take(limit)
        .map(|(s, e)| text_match(content, &lines, s, e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::search::matchers::test_support::Fixture;

    async fn fixture() -> Fixture {
        Fixture::new(vec![
            Document::new("a.py", "def foo(): pass\nprint(foo)", "python"),
            Document::new("b.js", "function foobar() {}", "javascript"),
            Document::new("c.txt", "shopping list", "text"),
        ])
        .await
    }

    #[tokio::test]
    async fn test_exact_outscores_partial() {
        let fx = fixture().await;
        let results = TextMatcher.find(&fx.ctx(), "foo").await;

        let score = |name: &str| {
            results
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.relevance_score)
        };
        assert_eq!(score("a.py"), Some(2.0));
        assert_eq!(score("b.js"), Some(1.0));
        assert_eq!(score("c.txt"), None);
    }

    #[tokio::test]
    async fn test_case_insensitive() {
        let fx = fixture().await;
        let lower = TextMatcher.find(&fx.ctx(), "print").await;
        let upper = TextMatcher.find(&fx.ctx(), "Print").await;
        assert!(!lower.is_empty());
        assert_eq!(lower, upper);
    }

    #[tokio::test]
    async fn test_matches_and_highlights() {
        let fx = fixture().await;
        let results = TextMatcher.find(&fx.ctx(), "foo").await;
        let a = results.iter().find(|r| r.name == "a.py").unwrap();

        assert_eq!(a.matches.len(), 2);
        assert_eq!(a.matches[0].text, "foo");
        assert_eq!(a.matches[0].line, 1);
        assert_eq!(a.matches[1].line, 2);
        for &(s, e) in &a.highlight_ranges {
            assert_eq!(a.preview_snippet[s..e].to_lowercase(), "foo");
        }
    }

    #[tokio::test]
    async fn test_stop_word_query_is_empty() {
        let fx = fixture().await;
        assert!(TextMatcher.find(&fx.ctx(), "the a").await.is_empty());
    }
}
