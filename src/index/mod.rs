//! Per-tenant inverted indices
//!
//! A [`TenantIndex`] holds four term → document-key maps built from one snapshot of a
//! tenant's documents. It stores keys only; content is resolved from the store on demand.

pub mod cache;
pub mod tokenize;

use crate::analysis::CodeAnalyzer;
use crate::document::{Document, DocumentKey};
use crate::error::AppError;
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub use cache::{IndexCache, IndexHandle};

/// Term → set of documents containing it
pub type PostingMap = BTreeMap<String, BTreeSet<DocumentKey>>;

/// Immutable index over one snapshot of a tenant's documents
#[derive(Debug, Clone)]
pub struct TenantIndex {
    tenant_id: String,
    token_index: PostingMap,
    function_index: PostingMap,
    language_index: PostingMap,
    tag_index: PostingMap,
    document_count: usize,
    built_at: DateTime<Utc>,
}

/// Read-only summary of a tenant index
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatistics {
    pub token_count: usize,
    pub function_count: usize,
    pub language_count: usize,
    pub tag_count: usize,
    pub document_count: usize,
    pub built_at: DateTime<Utc>,
    /// Most widespread tokens with their document counts
    pub top_tokens: Vec<(String, usize)>,
    /// Every language with its document count, most common first
    pub top_languages: Vec<(String, usize)>,
    pub top_tags: Vec<(String, usize)>,
    /// Set when the index could not be refreshed and an older build is being served
    pub stale: bool,
}

impl TenantIndex {
    /// Fetch the tenant's full snapshot and build a fresh index from it
    pub async fn rebuild(
        tenant: &str,
        store: &dyn DocumentStore,
        analyzer: &dyn CodeAnalyzer,
    ) -> Result<Self, AppError> {
        let started = Instant::now();
        debug!("Rebuilding index for tenant {}", tenant);

        let documents = store.list_documents(tenant).await?;
        let index = Self::build(tenant, &documents, analyzer)?;

        info!(
            "Indexed {} documents for tenant {} ({} tokens, {} functions) in {:?}",
            index.document_count,
            tenant,
            index.token_index.len(),
            index.function_index.len(),
            started.elapsed()
        );
        Ok(index)
    }

    /// Build all four maps from one document snapshot
    pub fn build(
        tenant: &str,
        documents: &[Document],
        analyzer: &dyn CodeAnalyzer,
    ) -> Result<Self, AppError> {
        let mut token_index = PostingMap::new();
        let mut function_index = PostingMap::new();
        let mut language_index = PostingMap::new();
        let mut tag_index = PostingMap::new();

        for doc in documents {
            let key = DocumentKey::new(tenant, doc.name.clone());

            for token in tokenize::index_terms(&doc.content) {
                token_index.entry(token).or_default().insert(key.clone());
            }

            for function in analyzer.extract_functions(&doc.content, &doc.language)? {
                function_index
                    .entry(function.name.to_lowercase())
                    .or_default()
                    .insert(key.clone());
            }

            let language = doc.language.trim().to_lowercase();
            if !language.is_empty() {
                language_index.entry(language).or_default().insert(key.clone());
            }

            for tag in &doc.tags {
                let tag = tag.trim().to_lowercase();
                if !tag.is_empty() {
                    tag_index.entry(tag).or_default().insert(key.clone());
                }
            }
        }

        Ok(Self {
            tenant_id: tenant.to_string(),
            token_index,
            function_index,
            language_index,
            tag_index,
            document_count: documents.len(),
            built_at: Utc::now(),
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn tokens(&self) -> &PostingMap {
        &self.token_index
    }

    pub fn functions(&self) -> &PostingMap {
        &self.function_index
    }

    pub fn languages(&self) -> &PostingMap {
        &self.language_index
    }

    pub fn tags(&self) -> &PostingMap {
        &self.tag_index
    }

    /// Whether the index is older than `max_age`
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.is_stale_at(Utc::now(), max_age)
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match now.signed_duration_since(self.built_at).to_std() {
            Ok(age) => age > max_age,
            // built_at lies in the future (clock skew)
            Err(_) => false,
        }
    }

    /// Summarize the index; `stale` is filled in by the caller
    pub fn statistics(&self, top_tokens: usize, top_tags: usize) -> IndexStatistics {
        IndexStatistics {
            token_count: self.token_index.len(),
            function_count: self.function_index.len(),
            language_count: self.language_index.len(),
            tag_count: self.tag_index.len(),
            document_count: self.document_count,
            built_at: self.built_at,
            top_tokens: most_common(&self.token_index, top_tokens),
            top_languages: most_common(&self.language_index, usize::MAX),
            top_tags: most_common(&self.tag_index, top_tags),
            stale: false,
        }
    }
}

/// Keys of `map` starting with `prefix` (already lower-cased), in sorted order
pub fn prefix_matches<'a>(map: &'a PostingMap, prefix: &'a str) -> impl Iterator<Item = &'a String> + 'a {
    map.range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
        .map(|(term, _)| term)
        .take_while(move |term| term.starts_with(prefix))
}

/// Terms ordered by document count (descending, ties by term), truncated to `limit`
fn most_common(map: &PostingMap, limit: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = map
        .iter()
        .map(|(term, keys)| (term.clone(), keys.len()))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PatternAnalyzer;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("a.py", "def foo(): pass\nprint(foo)", "Python").with_tags(["Utils"]),
            Document::new("b.js", "function foo() { console.log('x') }", "javascript")
                .with_tags(["utils", "web"]),
        ]
    }

    #[test]
    fn test_build_populates_all_maps() {
        let analyzer = PatternAnalyzer::new().unwrap();
        let index = TenantIndex::build("u1", &corpus(), &analyzer).unwrap();

        assert_eq!(index.document_count(), 2);
        assert_eq!(index.tokens()["foo"].len(), 2);
        assert!(index.tokens().contains_key("print"));
        assert!(!index.tokens().contains_key("x"));
        assert_eq!(index.functions()["foo"].len(), 2);
        assert!(index.languages().contains_key("python"));
        assert_eq!(index.tags()["utils"].len(), 2);
        assert_eq!(
            index.tokens()["print"].iter().next().unwrap(),
            &DocumentKey::new("u1", "a.py")
        );
    }

    #[test]
    fn test_staleness() {
        let analyzer = PatternAnalyzer::new().unwrap();
        let index = TenantIndex::build("u1", &[], &analyzer).unwrap();
        let max_age = Duration::from_secs(30 * 60);

        assert!(!index.is_stale_at(index.built_at(), max_age));
        assert!(!index.is_stale_at(index.built_at() + chrono::Duration::minutes(30), max_age));
        assert!(index.is_stale_at(index.built_at() + chrono::Duration::minutes(31), max_age));
        assert!(!index.is_stale_at(index.built_at() - chrono::Duration::minutes(5), max_age));
    }

    #[test]
    fn test_prefix_matches() {
        let analyzer = PatternAnalyzer::new().unwrap();
        let docs = vec![Document::new("x", "format formula form fork", "text")];
        let index = TenantIndex::build("u1", &docs, &analyzer).unwrap();

        let found: Vec<&String> = prefix_matches(index.tokens(), "form").collect();
        assert_eq!(found, vec!["form", "format", "formula"]);
    }

    #[test]
    fn test_statistics() {
        let analyzer = PatternAnalyzer::new().unwrap();
        let index = TenantIndex::build("u1", &corpus(), &analyzer).unwrap();
        let stats = index.statistics(10, 20);

        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.language_count, 2);
        assert_eq!(stats.top_tokens[0], ("foo".to_string(), 2));
        assert_eq!(stats.top_tags[0], ("utils".to_string(), 2));
        assert!(!stats.stale);
    }
}
