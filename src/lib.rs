//! # flashdeck
//!
//! 语言学习闪卡与语音的服务端缓存编排层：按请求参数派生缓存键，命中则直接返回，
//! 未命中则调用生成服务并持久化结果。
//!
//! Server-side cache-aside orchestration for language-learning flashcard decks
//! and text-to-speech audio.
//!
//! ## Overview
//!
//! Each request is reduced to a deterministic [`cache::CacheKey`]. A hit is
//! served straight from the durable store. A miss asks the
//! [`provider::GenerationProvider`] for content, attaches card images through
//! a concurrent fan-out, writes the result back once and returns it. Cached
//! documents are never updated or expired.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flashdeck::cache::SqliteStore;
//! use flashdeck::config::ServerConfig;
//! use flashdeck::service::FlashcardService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let store = Arc::new(SqliteStore::open(&config.db_path)?);
//!     let provider = Arc::new(config.provider_builder().build()?);
//!     let service = Arc::new(FlashcardService::new(provider, store, config.service_config()));
//!
//!     let listener = tokio::net::TcpListener::bind(config.listen_address()).await?;
//!     flashdeck::server::serve(listener, service).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Deck, card and audio payload types |
//! | [`cache`] | Key derivation, store trait and backends |
//! | [`provider`] | Generation provider trait and the Gemini client |
//! | [`fanout`] | Concurrent per-card image generation |
//! | [`service`] | Cache-aside request orchestration |
//! | [`server`] | HTTP routes |
//! | [`config`] | Environment configuration |

pub mod cache;
pub mod config;
pub mod fanout;
pub mod provider;
pub mod server;
pub mod service;
pub mod types;

pub use service::{CacheStatus, FlashcardService, Served, ServiceConfig};
pub use types::{AudioPayload, DeckRequest, Difficulty, FlashcardRecord};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
