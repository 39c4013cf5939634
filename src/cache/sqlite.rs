//! Durable cache store backed by SQLite.
//!
//! One table per [`Collection`]. rusqlite is blocking, so every call runs on
//! the blocking pool behind a shared connection.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use super::backend::{CacheStore, Collection};
use super::key::CacheKey;
use crate::{Error, ErrorContext, Result};

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        // WAL mode for concurrent readers
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let store = Self::init(conn)?;
        info!(path = %path.display(), "SQLite cache store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        for collection in Collection::ALL {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    cache_key TEXT PRIMARY KEY,
                    document BLOB NOT NULL
                );",
                collection.name()
            ))?;
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| {
                Error::store_with_context(
                    "connection mutex poisoned",
                    ErrorContext::new().with_source("sqlite_store"),
                )
            })?;
            f(&guard)
        })
        .await
        .map_err(|e| {
            Error::store_with_context(
                format!("blocking task failed: {}", e),
                ErrorContext::new().with_source("sqlite_store"),
            )
        })?
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn exists(&self, collection: Collection, key: &CacheKey) -> Result<bool> {
        let key = key.as_str().to_string();
        self.with_conn(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    &format!("SELECT 1 FROM {} WHERE cache_key = ?1", collection.name()),
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn get(&self, collection: Collection, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let key = key.as_str().to_string();
        self.with_conn(move |conn| {
            let document: Option<Vec<u8>> = conn
                .query_row(
                    &format!("SELECT document FROM {} WHERE cache_key = ?1", collection.name()),
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(document)
        })
        .await
    }

    async fn put(&self, collection: Collection, key: &CacheKey, data: &[u8]) -> Result<()> {
        let key = key.as_str().to_string();
        let data = data.to_vec();
        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {} (cache_key, document) VALUES (?1, ?2)",
                    collection.name()
                ),
                params![key, data],
            )?;
            Ok(())
        })
        .await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
