//! Cache store trait and the in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::key::CacheKey;
use crate::Result;

/// Logical collection a document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Decks,
    Audio,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Decks, Collection::Audio];

    /// Table / collection name in the durable store.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Decks => "flashcard_decks",
            Self::Audio => "audio_clips",
        }
    }
}

/// Durable key -> document mapping. Point lookups only.
///
/// `put` overwrites any document already stored under the key; concurrent
/// writers for one key resolve last-writer-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn exists(&self, collection: Collection, key: &CacheKey) -> Result<bool>;
    /// The serialized document stored under `key`.
    async fn get(&self, collection: Collection, key: &CacheKey) -> Result<Option<Vec<u8>>>;
    async fn put(&self, collection: Collection, key: &CacheKey, data: &[u8]) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Process-local store, used by tests and ephemeral runs.
#[derive(Default, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<(Collection, String), Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.entries
            .read()
            .await
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn exists(&self, collection: Collection, key: &CacheKey) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.contains_key(&(collection, key.as_str().to_string())))
    }

    async fn get(&self, collection: Collection, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(collection, key.as_str().to_string()))
            .cloned())
    }

    async fn put(&self, collection: Collection, key: &CacheKey, data: &[u8]) -> Result<()> {
        self.entries
            .write()
            .await
            .insert((collection, key.as_str().to_string()), data.to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
