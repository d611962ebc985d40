//! Matching strategies
//!
//! Each [`Matcher`] turns a query into scored candidates for one [`SearchType`]. Matchers
//! never fail: collaborator errors are logged and the affected documents are skipped.

mod content;
mod function;
mod fuzzy;
mod pattern;
mod text;

pub use content::ContentMatcher;
pub use function::FunctionMatcher;
pub use fuzzy::FuzzyTextMatcher;
pub use pattern::RegexMatcher;
pub use text::TextMatcher;

use super::types::{SearchResult, SearchType, TextMatch};
use crate::analysis::LineIndex;
use crate::config::EngineConfig;
use crate::document::{Document, DocumentKey};
use crate::index::TenantIndex;
use crate::store::DocumentStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Everything a matcher may consult for one query
pub struct MatchContext<'a> {
    pub tenant: &'a str,
    pub index: &'a TenantIndex,
    pub store: &'a dyn DocumentStore,
    pub config: &'a EngineConfig,
}

impl MatchContext<'_> {
    /// Resolve an index hit to the document's latest version
    pub async fn resolve(&self, key: &DocumentKey) -> Option<Document> {
        match self.store.get_latest_document(&key.tenant_id, &key.name).await {
            Ok(Some(doc)) => Some(doc),
            Ok(None) => {
                debug!("Index hit {} no longer exists, skipping", key);
                None
            }
            Err(e) => {
                warn!("Failed to resolve index hit {}: {}", key, e);
                None
            }
        }
    }

    /// Full document snapshot for strategies that bypass the index
    pub async fn snapshot(&self) -> Vec<Document> {
        match self.store.list_documents(self.tenant).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Failed to load documents for tenant {}: {}", self.tenant, e);
                Vec::new()
            }
        }
    }

    /// Resolve scored keys to results, in key order
    pub async fn resolve_scored(
        &self,
        scores: HashMap<DocumentKey, f64>,
    ) -> Vec<(Document, f64)> {
        let mut keys: Vec<(DocumentKey, f64)> = scores.into_iter().collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0));

        let mut resolved = Vec::with_capacity(keys.len());
        for (key, score) in keys {
            if let Some(doc) = self.resolve(&key).await {
                resolved.push((doc, score));
            }
        }
        resolved
    }
}

/// One matching strategy
#[async_trait]
pub trait Matcher: Send + Sync {
    fn search_type(&self) -> SearchType;

    /// Scored candidates for `query`, unfiltered and unsorted
    async fn find(&self, ctx: &MatchContext<'_>, query: &str) -> Vec<SearchResult>;
}

/// Matchers for every implemented search type
pub fn default_matchers() -> HashMap<SearchType, Box<dyn Matcher>> {
    let matchers: Vec<Box<dyn Matcher>> = vec![
        Box::new(TextMatcher),
        Box::new(RegexMatcher),
        Box::new(FuzzyTextMatcher),
        Box::new(FunctionMatcher),
        Box::new(ContentMatcher),
    ];
    matchers
        .into_iter()
        .map(|m| (m.search_type(), m))
        .collect()
}

/// Build a located match from byte offsets into `content`
pub(crate) fn text_match(
    content: &str,
    lines: &LineIndex,
    start: usize,
    end: usize,
) -> TextMatch {
    TextMatch {
        start,
        end,
        text: content[start..end].to_string(),
        line: lines.line(start),
    }
}
