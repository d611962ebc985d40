//! Document storage collaborator
//!
//! The engine only reads from storage: a full snapshot per tenant when rebuilding an index,
//! and single latest-version lookups when resolving index hits back to content.

use crate::document::Document;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;

/// Read access to a tenant's documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Latest version of every document the tenant owns, in one call
    async fn list_documents(&self, tenant: &str) -> Result<Vec<Document>, AppError>;

    /// Latest version of one document, if it still exists
    async fn get_latest_document(
        &self,
        tenant: &str,
        name: &str,
    ) -> Result<Option<Document>, AppError>;
}

/// Versioned in-process store; keeps every version of every document
#[derive(Default)]
pub struct MemoryStore {
    tenants: RwLock<HashMap<String, BTreeMap<String, Vec<Document>>>>,
}

/// On-disk corpus layout accepted by [`MemoryStore::from_json_file`]
#[derive(Debug, Deserialize)]
struct Corpus {
    tenants: HashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a corpus of the form `{"tenants": {"<id>": [document, ...]}}`
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, AppError> {
        let corpus: Corpus = serde_json::from_str(data)?;
        let mut tenants: HashMap<String, BTreeMap<String, Vec<Document>>> = HashMap::new();

        for (tenant, documents) in corpus.tenants {
            let slots = tenants.entry(tenant).or_default();
            for doc in documents {
                let history = slots.entry(doc.name.clone()).or_default();
                history.push(doc);
                history.sort_by_key(|d| d.version);
            }
        }

        debug!("Loaded corpus with {} tenants", tenants.len());
        Ok(Self {
            tenants: RwLock::new(tenants),
        })
    }

    /// Store a new version of a document.
    ///
    /// The version is assigned here: one past the latest stored version of the same name.
    /// `created_at` is carried over from the first version.
    pub async fn put(&self, tenant: &str, mut doc: Document) -> u32 {
        let mut tenants = self.tenants.write().await;
        let history = tenants
            .entry(tenant.to_string())
            .or_default()
            .entry(doc.name.clone())
            .or_default();

        if let Some(latest) = history.last() {
            doc.version = latest.version + 1;
            doc.created_at = history[0].created_at;
            doc.updated_at = Utc::now().max(latest.updated_at);
        } else {
            doc.version = 1;
        }

        let version = doc.version;
        history.push(doc);
        version
    }

    /// Remove every version of a document; returns whether it existed
    pub async fn delete(&self, tenant: &str, name: &str) -> bool {
        let mut tenants = self.tenants.write().await;
        tenants
            .get_mut(tenant)
            .and_then(|slots| slots.remove(name))
            .is_some()
    }

    /// All stored versions of a document, oldest first
    pub async fn history(&self, tenant: &str, name: &str) -> Vec<Document> {
        let tenants = self.tenants.read().await;
        tenants
            .get(tenant)
            .and_then(|slots| slots.get(name))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn tenant_ids(&self) -> Vec<String> {
        let tenants = self.tenants.read().await;
        let mut ids: Vec<String> = tenants.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self, tenant: &str) -> Result<Vec<Document>, AppError> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant)
            .map(|slots| slots.values().filter_map(|h| h.last().cloned()).collect())
            .unwrap_or_default())
    }

    async fn get_latest_document(
        &self,
        tenant: &str,
        name: &str,
    ) -> Result<Option<Document>, AppError> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant)
            .and_then(|slots| slots.get(name))
            .and_then(|h| h.last().cloned()))
    }
}
