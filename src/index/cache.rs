//! Tenant → index cache
//!
//! Each tenant gets a slot guarded by an async `RwLock`. Fresh indexes are served from the
//! read side; a stale or missing index is rebuilt under the write side, and the freshness
//! check is repeated after the write lock is acquired so concurrent callers rebuild once.
//! The slot map itself is bounded: least-recently-used tenants are evicted past
//! `max_cached_tenants`, and tenants idle longer than the idle TTL are swept on access.
//! A slot still held by an in-flight caller is never evicted, so the map may briefly
//! exceed its capacity while those callers finish.

use super::TenantIndex;
use crate::analysis::CodeAnalyzer;
use crate::config::EngineConfig;
use crate::error::AppError;
use crate::store::DocumentStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// An index as handed to a caller
#[derive(Debug, Clone)]
pub struct IndexHandle {
    pub index: Arc<TenantIndex>,
    /// True when the last rebuild failed and an older index is being served
    pub stale: bool,
}

#[derive(Default)]
struct TenantSlot {
    index: RwLock<Option<Arc<TenantIndex>>>,
}

struct SlotEntry {
    slot: Arc<TenantSlot>,
    last_access: Instant,
}

impl SlotEntry {
    /// Some caller between `slot()` and the end of `get()` still holds this slot
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.slot) > 1
    }
}

pub struct IndexCache {
    slots: Mutex<HashMap<String, SlotEntry>>,
    store: Arc<dyn DocumentStore>,
    analyzer: Arc<dyn CodeAnalyzer>,
    staleness: Duration,
    capacity: usize,
    idle_ttl: Duration,
    rebuilds: AtomicU64,
}

impl IndexCache {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        analyzer: Arc<dyn CodeAnalyzer>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            store,
            analyzer,
            staleness: config.staleness(),
            capacity: config.max_cached_tenants.max(1),
            idle_ttl: config.tenant_idle_ttl(),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// Return the tenant's index, rebuilding it first when missing or stale.
    ///
    /// Fails only when no index has ever been built for the tenant and the rebuild fails;
    /// otherwise a failed rebuild falls back to the previous index with `stale` set.
    pub async fn get(&self, tenant: &str) -> Result<IndexHandle, AppError> {
        let slot = self.slot(tenant).await;

        {
            let current = slot.index.read().await;
            if let Some(index) = current.as_ref() {
                if !index.is_stale(self.staleness) {
                    debug!("Index cache hit for tenant {}", tenant);
                    return Ok(IndexHandle {
                        index: Arc::clone(index),
                        stale: false,
                    });
                }
            }
        }

        let mut current = slot.index.write().await;

        // Another caller may have rebuilt while we waited for the write lock
        if let Some(index) = current.as_ref() {
            if !index.is_stale(self.staleness) {
                return Ok(IndexHandle {
                    index: Arc::clone(index),
                    stale: false,
                });
            }
        }

        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        match TenantIndex::rebuild(tenant, self.store.as_ref(), self.analyzer.as_ref()).await {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                *current = Some(Arc::clone(&fresh));
                Ok(IndexHandle {
                    index: fresh,
                    stale: false,
                })
            }
            Err(e) => match current.as_ref() {
                Some(previous) => {
                    warn!(
                        "Index rebuild failed for tenant {}, serving index built at {}: {}",
                        tenant,
                        previous.built_at(),
                        e
                    );
                    Ok(IndexHandle {
                        index: Arc::clone(previous),
                        stale: true,
                    })
                }
                None => {
                    warn!("Index rebuild failed for tenant {}: {}", tenant, e);
                    Err(AppError::IndexUnavailable {
                        tenant: tenant.to_string(),
                        reason: e.to_string(),
                    })
                }
            },
        }
    }

    /// Drop a tenant's cached index so the next read rebuilds it
    pub async fn invalidate(&self, tenant: &str) -> bool {
        let removed = self.slots.lock().await.remove(tenant).is_some();
        if removed {
            debug!("Invalidated index for tenant {}", tenant);
        }
        removed
    }

    /// Tenants currently holding a cache slot, sorted
    pub async fn cached_tenants(&self) -> Vec<String> {
        let slots = self.slots.lock().await;
        let mut tenants: Vec<String> = slots.keys().cloned().collect();
        tenants.sort();
        tenants
    }

    /// Number of rebuilds started since the cache was created
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    /// Remove slots idle for longer than the idle TTL; returns how many were dropped
    pub async fn evict_idle(&self) -> usize {
        let mut slots = self.slots.lock().await;
        Self::sweep_idle(&mut slots, self.idle_ttl, Instant::now())
    }

    async fn slot(&self, tenant: &str) -> Arc<TenantSlot> {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();

        Self::sweep_idle(&mut slots, self.idle_ttl, now);

        if let Some(entry) = slots.get_mut(tenant) {
            entry.last_access = now;
            return Arc::clone(&entry.slot);
        }

        while slots.len() >= self.capacity {
            let Some(oldest) = slots
                .iter()
                .filter(|(_, entry)| !entry.in_use())
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(name, _)| name.clone())
            else {
                break;
            };
            slots.remove(&oldest);
            debug!("Evicted least recently used index for tenant {}", oldest);
        }

        let slot = Arc::new(TenantSlot::default());
        slots.insert(
            tenant.to_string(),
            SlotEntry {
                slot: Arc::clone(&slot),
                last_access: now,
            },
        );
        slot
    }

    fn sweep_idle(slots: &mut HashMap<String, SlotEntry>, idle_ttl: Duration, now: Instant) -> usize {
        let before = slots.len();
        slots.retain(|tenant, entry| {
            let keep =
                entry.in_use() || now.saturating_duration_since(entry.last_access) <= idle_ttl;
            if !keep {
                debug!("Dropping idle index for tenant {}", tenant);
            }
            keep
        });
        before - slots.len()
    }
}
