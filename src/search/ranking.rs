//! Filtering & ordering of candidate results
//!
//! Filters are conjunctive: every constraint present on the [`SearchFilter`] must hold.
//! Orderings break ties by name so results are deterministic.

use super::types::{SearchFilter, SearchResult, SortOrder};
use crate::analysis::CodeAnalyzer;
use regex::RegexBuilder;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, warn};

/// A [`SearchFilter`] prepared for repeated evaluation
pub struct CompiledFilter {
    languages: HashSet<String>,
    tags: HashSet<String>,
    filter: SearchFilter,
    file_pattern: FilePattern,
}

enum FilePattern {
    Any,
    Matches(regex::Regex),
    /// The pattern failed to compile; nothing can satisfy it
    Invalid,
}

impl CompiledFilter {
    pub fn new(filter: &SearchFilter) -> Self {
        let lower_set = |values: &[String]| -> HashSet<String> {
            values
                .iter()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect()
        };

        let file_pattern = match filter.file_pattern.as_deref() {
            None | Some("") => FilePattern::Any,
            Some(pattern) => match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => FilePattern::Matches(re),
                Err(e) => {
                    warn!("Ignoring results for invalid file pattern {:?}: {}", pattern, e);
                    FilePattern::Invalid
                }
            },
        };

        Self {
            languages: lower_set(&filter.languages),
            tags: lower_set(&filter.tags),
            filter: filter.clone(),
            file_pattern,
        }
    }

    /// Whether a result satisfies every constraint
    pub fn matches(&self, result: &SearchResult, analyzer: &dyn CodeAnalyzer) -> bool {
        if !self.languages.is_empty()
            && !self.languages.contains(&result.language.trim().to_lowercase())
        {
            return false;
        }

        if !self.tags.is_empty()
            && !result
                .tags
                .iter()
                .any(|t| self.tags.contains(&t.trim().to_lowercase()))
        {
            return false;
        }

        if self.filter.date_from.is_some_and(|from| result.updated_at < from) {
            return false;
        }
        if self.filter.date_to.is_some_and(|to| result.updated_at > to) {
            return false;
        }

        let size = result.size();
        if self.filter.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.filter.max_size.is_some_and(|max| size > max) {
            return false;
        }

        match &self.file_pattern {
            FilePattern::Any => {}
            FilePattern::Matches(re) => {
                if !re.is_match(&result.name) {
                    return false;
                }
            }
            FilePattern::Invalid => return false,
        }

        if let Some(wanted) = self.filter.has_functions {
            let found = analyzer
                .extract_functions(&result.content, &result.language)
                .map(|f| !f.is_empty())
                .unwrap_or_else(|e| {
                    debug!("Function analysis failed for {}: {}", result.name, e);
                    false
                });
            if found != wanted {
                return false;
            }
        }

        if let Some(wanted) = self.filter.has_classes {
            let found = analyzer
                .extract_classes(&result.content, &result.language)
                .map(|c| !c.is_empty())
                .unwrap_or_else(|e| {
                    debug!("Class analysis failed for {}: {}", result.name, e);
                    false
                });
            if found != wanted {
                return false;
            }
        }

        true
    }
}

/// Keep only results satisfying `filter`
pub fn apply_filter(
    results: Vec<SearchResult>,
    filter: &SearchFilter,
    analyzer: &dyn CodeAnalyzer,
) -> Vec<SearchResult> {
    if filter.is_empty() {
        return results;
    }
    let compiled = CompiledFilter::new(filter);
    results
        .into_iter()
        .filter(|r| compiled.matches(r, analyzer))
        .collect()
}

/// Order results in place
pub fn sort_results(results: &mut [SearchResult], order: SortOrder) {
    let by_name = |a: &SearchResult, b: &SearchResult| a.name.cmp(&b.name);

    match order {
        SortOrder::Relevance => results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| by_name(a, b))
        }),
        SortOrder::DateDesc => {
            results.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| by_name(a, b)))
        }
        SortOrder::DateAsc => {
            results.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then_with(|| by_name(a, b)))
        }
        SortOrder::NameAsc => results.sort_by(by_name),
        SortOrder::NameDesc => results.sort_by(|a, b| by_name(b, a)),
        SortOrder::SizeDesc => {
            results.sort_by(|a, b| b.size().cmp(&a.size()).then_with(|| by_name(a, b)))
        }
        SortOrder::SizeAsc => {
            results.sort_by(|a, b| a.size().cmp(&b.size()).then_with(|| by_name(a, b)))
        }
    }
}
