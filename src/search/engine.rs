//! Search Engine
//!
//! Facade over the index cache and the matching strategies. A search resolves the tenant's
//! index (rebuilding it when stale), runs the strategy registered for the search type, then
//! filters, sorts and truncates the candidates.

use super::matchers::{default_matchers, MatchContext, Matcher};
use super::ranking::{apply_filter, sort_results};
use super::types::{SearchFilter, SearchResult, SearchType, SortOrder};
use crate::analysis::CodeAnalyzer;
use crate::config::EngineConfig;
use crate::error::{validate_tenant, AppError};
use crate::index::{prefix_matches, IndexCache, IndexStatistics};
use crate::store::DocumentStore;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Completions shorter than this are not looked up
const MIN_COMPLETION_CHARS: usize = 2;
const TOP_TOKENS: usize = 10;
const TOP_TAGS: usize = 20;

/// Multi-tenant search service
pub struct SearchEngine {
    cache: IndexCache,
    store: Arc<dyn DocumentStore>,
    analyzer: Arc<dyn CodeAnalyzer>,
    matchers: HashMap<SearchType, Box<dyn Matcher>>,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        analyzer: Arc<dyn CodeAnalyzer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            cache: IndexCache::new(Arc::clone(&store), Arc::clone(&analyzer), &config),
            store,
            analyzer,
            matchers: default_matchers(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &dyn CodeAnalyzer {
        self.analyzer.as_ref()
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// Search a tenant's documents.
    ///
    /// Query-shaped problems (blank query, malformed regex, no hits) produce an empty list.
    /// Errors are reserved for an invalid tenant id and an index that cannot be built.
    pub async fn search(
        &self,
        tenant: &str,
        query: &str,
        search_type: SearchType,
        filter: Option<&SearchFilter>,
        sort: SortOrder,
        limit: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        validate_tenant(tenant)?;
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let Some(matcher) = self.matchers.get(&search_type) else {
            debug!("No matcher registered for {} search", search_type);
            return Ok(Vec::new());
        };

        let handle = self.cache.get(tenant).await?;
        let ctx = MatchContext {
            tenant,
            index: &handle.index,
            store: self.store.as_ref(),
            config: &self.config,
        };

        let mut results = matcher.find(&ctx, query).await;
        let candidates = results.len();

        if let Some(filter) = filter {
            results = apply_filter(results, filter, self.analyzer.as_ref());
        }
        sort_results(&mut results, sort);
        results.truncate(limit);

        debug!(
            "{} search for tenant {}: {} candidates, {} returned",
            search_type,
            tenant,
            candidates,
            results.len()
        );
        Ok(results)
    }

    /// Search with the configured default limit
    pub async fn search_default(
        &self,
        tenant: &str,
        query: &str,
        search_type: SearchType,
    ) -> Result<Vec<SearchResult>, AppError> {
        self.search(
            tenant,
            query,
            search_type,
            None,
            SortOrder::Relevance,
            self.config.default_limit,
        )
        .await
    }

    /// Indexed tokens, function names, languages and `#tags` starting with `partial`,
    /// shortest first
    pub async fn suggest_completions(
        &self,
        tenant: &str,
        partial: &str,
        limit: usize,
    ) -> Result<Vec<String>, AppError> {
        validate_tenant(tenant)?;
        let prefix = partial.trim().to_lowercase();
        if prefix.chars().count() < MIN_COMPLETION_CHARS {
            return Ok(Vec::new());
        }

        let handle = self.cache.get(tenant).await?;
        let index = &handle.index;

        let mut found: BTreeSet<String> = BTreeSet::new();
        for map in [index.tokens(), index.functions(), index.languages()] {
            found.extend(prefix_matches(map, &prefix).cloned());
        }
        found.extend(prefix_matches(index.tags(), &prefix).map(|tag| format!("#{}", tag)));

        let mut suggestions: Vec<String> = found.into_iter().collect();
        suggestions.sort_by(|a, b| {
            a.chars()
                .count()
                .cmp(&b.chars().count())
                .then_with(|| a.cmp(b))
        });
        suggestions.truncate(limit);
        Ok(suggestions)
    }

    /// Summary of the tenant's current index
    pub async fn statistics(&self, tenant: &str) -> Result<IndexStatistics, AppError> {
        validate_tenant(tenant)?;
        let handle = self.cache.get(tenant).await?;
        let mut stats = handle.index.statistics(TOP_TOKENS, TOP_TAGS);
        stats.stale = handle.stale;
        Ok(stats)
    }

    /// Drop a tenant's cached index so the next call rebuilds it
    pub async fn invalidate(&self, tenant: &str) -> bool {
        self.cache.invalidate(tenant).await
    }

    pub async fn cached_tenants(&self) -> Vec<String> {
        self.cache.cached_tenants().await
    }
}
