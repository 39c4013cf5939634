//! Typed cache manager.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

use super::backend::{CacheStore, Collection};
use super::key::CacheKey;
use crate::Result;

/// A decoded cache document.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub created_at: DateTime<Utc>,
}

/// Persisted layout: payload fields plus `createdAt`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document<T> {
    #[serde(flatten)]
    payload: T,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Serializes payloads into documents and keeps hit/miss counters.
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    stats: AtomicStats,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            stats: AtomicStats::default(),
        }
    }

    /// Look up `key` and count the outcome. Store errors are returned and
    /// counted; a stored document that no longer decodes counts as a miss.
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &CacheKey,
    ) -> Result<Option<CacheEntry<T>>> {
        let result = self.peek(collection, key).await;
        match result {
            Ok(Some(_)) => self.record_hit(),
            Ok(None) => self.record_miss(),
            Err(_) => self.record_error(),
        }
        result
    }

    /// Look up `key` without touching the counters.
    pub async fn peek<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &CacheKey,
    ) -> Result<Option<CacheEntry<T>>> {
        let Some(data) = self.store.get(collection, key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Document<T>>(&data) {
            Ok(decoded) => Ok(Some(CacheEntry {
                payload: decoded.payload,
                created_at: decoded.created_at,
            })),
            Err(e) => {
                warn!(key = %key, collection = collection.name(), error = %e, "undecodable cache document");
                Ok(None)
            }
        }
    }

    pub fn record_hit(&self) {
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.stats.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Write `payload` under `key`, stamped with the current time.
    pub async fn put<T: Serialize>(
        &self,
        collection: Collection,
        key: &CacheKey,
        payload: &T,
    ) -> Result<()> {
        let doc = Document {
            payload,
            created_at: Utc::now(),
        };
        let data = serde_json::to_vec(&doc)?;
        match self.store.put(collection, key, &data).await {
            Ok(()) => {
                self.stats.writes.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.record_error();
                Err(e)
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}
