//! Function-name search over the function index

use super::{text_match, MatchContext, Matcher};
use crate::analysis::LineIndex;
use crate::document::DocumentKey;
use crate::index::tokenize::word_spans;
use crate::search::fuzzy::FuzzyMatcher;
use crate::search::preview;
use crate::search::types::{SearchResult, SearchType, TextMatch};
use async_trait::async_trait;
use std::collections::HashMap;

const NAME_WEIGHT: f64 = 2.0;

/// Indexed function names containing the query, each weighted by its similarity to it
pub struct FunctionMatcher;

#[async_trait]
impl Matcher for FunctionMatcher {
    fn search_type(&self) -> SearchType {
        SearchType::Function
    }

    async fn find(&self, ctx: &MatchContext<'_>, query: &str) -> Vec<SearchResult> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let similarity = FuzzyMatcher::new();
        let mut scores: HashMap<DocumentKey, f64> = HashMap::new();
        let mut names: HashMap<DocumentKey, Vec<&str>> = HashMap::new();

        for (name, keys) in ctx.index.functions() {
            if !name.contains(needle.as_str()) {
                continue;
            }
            let weight = similarity.ratio(&needle, name) / 100.0 * NAME_WEIGHT;
            for key in keys {
                *scores.entry(key.clone()).or_default() += weight;
                names.entry(key.clone()).or_default().push(name.as_str());
            }
        }

        let limit = ctx.config.max_matches_per_result;
        let context = ctx.config.preview_context_chars;

        ctx.resolve_scored(scores)
            .await
            .into_iter()
            .map(|(doc, score)| {
                let key = DocumentKey::new(ctx.tenant, doc.name.as_str());
                let wanted = names.get(&key).map(Vec::as_slice).unwrap_or_default();
                let matches = name_matches(&doc.content, wanted, limit);

                let mut result = SearchResult::from_document(doc, score);
                let snippet = match matches.first() {
                    Some(first) => preview::around(&result.content, first.start, first.end, context),
                    None => preview::leading(&result.content, context * 2),
                };
                result.matches = matches;
                result.preview_snippet = snippet.text;
                result.highlight_ranges = snippet.highlights;
                result
            })
            .collect()
    }
}

/// Occurrences of any of `names` as whole words in `content`
fn name_matches(content: &str, names: &[&str], limit: usize) -> Vec<TextMatch> {
    let lines = LineIndex::new(content);
    word_spans(content)
        .into_iter()
        .filter(|&(s, e)| {
            let word = content[s..e].to_lowercase();
            names.iter().any(|n| *n == word)
        })
        .take(limit)
        .map(|(s, e)| text_match(content, &lines, s, e))
        .collect()
}
