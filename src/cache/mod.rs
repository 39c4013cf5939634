//! 缓存模块：卡组与语音片段的持久化缓存。
//!
//! # Cache Module
//!
//! Durable, write-once caching of generated decks and speech clips.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`derive_deck_key`] / [`derive_audio_key`] | Deterministic key derivation |
//! | [`CacheStore`] | Trait for pluggable document stores |
//! | [`SqliteStore`] | Durable SQLite store (feature `sqlite`) |
//! | [`MemoryStore`] | Process-local store |
//! | [`CacheManager`] | Typed get/put with hit and miss statistics |
//!
//! ## Collections
//!
//! Decks and speech clips live in separate collections
//! (`flashcard_decks`, `audio_clips`). Each document holds the payload fields
//! and a `createdAt` timestamp. Nothing is ever expired or evicted.
//!
//! ## Example
//!
//! ```rust
//! use flashdeck::cache::{derive_deck_key, CacheManager, MemoryStore};
//! use flashdeck::types::Difficulty;
//! use std::sync::Arc;
//!
//! let key = derive_deck_key("English", "French", Difficulty::Beginner);
//! assert_eq!(key.as_str(), "deck_English_French_Beginner");
//!
//! let manager = CacheManager::new(Arc::new(MemoryStore::new()));
//! assert_eq!(manager.store_name(), "memory");
//! ```

mod backend;
mod key;
mod manager;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use backend::{CacheStore, Collection, MemoryStore};
pub use key::{derive_audio_key, derive_deck_key, AudioKeyScheme, CacheKey, TRUNCATED_AUDIO_TEXT_LEN};
pub use manager::{CacheEntry, CacheManager, CacheStats};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
