//! 编排模块：缓存旁路（cache-aside）的卡组与语音请求处理。
//!
//! # Cache-aside Orchestration
//!
//! Per request:
//!
//! ```text
//! derive key -> cache lookup -> hit:  respond with stored payload
//!                            -> miss: generate -> persist -> respond
//! ```
//!
//! - A store read error is treated as a miss.
//! - Generation runs once per request and is never retried here.
//! - A failed write is logged; the generated payload is still returned.
//! - With single-flight enabled, concurrent misses for the same key in this
//!   process wait for the first one and are then served from the cache.
//! - Generation and the write run in their own task, so a client that
//!   disconnects mid-request does not waste the provider calls.
//! - Each request counts exactly one cache hit or miss.

mod single_flight;

pub use single_flight::SingleFlight;

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn, Instrument};

use crate::cache::{
    derive_audio_key, derive_deck_key, AudioKeyScheme, CacheKey, CacheManager, CacheStats,
    CacheStore, Collection,
};
use crate::fanout::{DeckAssembler, FanOutConfig};
use crate::provider::GenerationProvider;
use crate::types::{AudioPayload, DeckPayload, DeckRequest, FlashcardRecord};
use crate::{Error, ErrorContext, Result};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub audio_key_scheme: AudioKeyScheme,
    pub single_flight: bool,
    pub fan_out: FanOutConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            audio_key_scheme: AudioKeyScheme::default(),
            single_flight: true,
            fan_out: FanOutConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_audio_key_scheme(mut self, scheme: AudioKeyScheme) -> Self {
        self.audio_key_scheme = scheme;
        self
    }
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }
    pub fn with_fan_out(mut self, fan_out: FanOutConfig) -> Self {
        self.fan_out = fan_out;
        self
    }
}

/// Which path produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Served<T> {
    pub payload: T,
    pub cache: CacheStatus,
    pub key: CacheKey,
}

enum Lookup<T> {
    Hit(T),
    /// Holds the single-flight guard, if enabled, until the key is written.
    Miss(Option<OwnedMutexGuard<()>>),
}

pub struct FlashcardService {
    provider: Arc<dyn GenerationProvider>,
    cache: Arc<CacheManager>,
    assembler: DeckAssembler,
    flights: SingleFlight,
    config: ServiceConfig,
}

impl FlashcardService {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        store: Arc<dyn CacheStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            assembler: DeckAssembler::new(Arc::clone(&provider), config.fan_out.clone()),
            provider,
            cache: Arc::new(CacheManager::new(store)),
            flights: SingleFlight::new(),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn store_name(&self) -> &'static str {
        self.cache.store_name()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Serve the deck for `request`, generating and caching it on a miss.
    pub async fn fetch_deck(&self, request: &DeckRequest) -> Result<Served<Vec<FlashcardRecord>>> {
        let key = derive_deck_key(
            &request.source_language_name,
            &request.target_language_name,
            request.difficulty,
        );

        let flight = match self.lookup_or_acquire::<DeckPayload>(Collection::Decks, &key).await {
            Lookup::Hit(payload) => {
                info!(key = %key, cards = payload.cards.len(), "deck cache hit");
                return Ok(Served {
                    payload: payload.cards,
                    cache: CacheStatus::Hit,
                    key,
                });
            }
            Lookup::Miss(flight) => flight,
        };

        info!(
            key = %key,
            source_lang = %request.source_language_name,
            target_lang = %request.target_language_name,
            difficulty = %request.difficulty,
            "deck cache miss, generating"
        );
        let provider = Arc::clone(&self.provider);
        let assembler = self.assembler.clone();
        let owned_request = request.clone();
        let generate = async move {
            let texts = provider.generate_deck_text(&owned_request).await?;
            Ok::<_, Error>(DeckPayload {
                cards: assembler.assemble_deck(texts).await,
            })
        };
        let payload = self
            .generate_and_persist(Collection::Decks, &key, flight, generate)
            .await
            .map_err(|e| {
                error!(
                    key = %key,
                    source_lang = %request.source_language_name,
                    target_lang = %request.target_language_name,
                    difficulty = %request.difficulty,
                    error = %e,
                    "deck generation failed"
                );
                e
            })?;

        Ok(Served {
            payload: payload.cards,
            cache: CacheStatus::Miss,
            key,
        })
    }

    /// Serve the speech clip for `text`, generating and caching it on a miss.
    pub async fn fetch_audio(&self, text: &str) -> Result<Served<AudioPayload>> {
        let key = derive_audio_key(text, self.config.audio_key_scheme);

        let flight = match self.lookup_or_acquire::<AudioPayload>(Collection::Audio, &key).await {
            Lookup::Hit(payload) => {
                info!(key = %key, "audio cache hit");
                return Ok(Served {
                    payload,
                    cache: CacheStatus::Hit,
                    key,
                });
            }
            Lookup::Miss(flight) => flight,
        };

        let text_len = text.chars().count();
        info!(key = %key, text_len, "audio cache miss, generating");
        let provider = Arc::clone(&self.provider);
        let owned_text = text.to_string();
        let generate = async move {
            let audio = provider.generate_speech_audio(&owned_text).await?;
            Ok::<_, Error>(AudioPayload::new(audio))
        };
        let payload = self
            .generate_and_persist(Collection::Audio, &key, flight, generate)
            .await
            .map_err(|e| {
                error!(key = %key, text_len, error = %e, "speech generation failed");
                e
            })?;

        Ok(Served {
            payload,
            cache: CacheStatus::Miss,
            key,
        })
    }

    async fn lookup_or_acquire<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &CacheKey,
    ) -> Lookup<T> {
        if let Some(payload) = self.lookup(collection, key, true).await {
            self.cache.record_hit();
            return Lookup::Hit(payload);
        }

        let mut flight = None;
        if self.config.single_flight {
            let guard = self.flights.acquire(key.as_str()).await;
            // another request may have filled the key while we waited
            if let Some(payload) = self.lookup(collection, key, false).await {
                debug!(key = %key, "filled by concurrent request");
                self.cache.record_hit();
                return Lookup::Hit(payload);
            }
            flight = Some(guard);
        }
        self.cache.record_miss();
        Lookup::Miss(flight)
    }

    /// Read errors are logged and reported as a miss.
    async fn lookup<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &CacheKey,
        count_errors: bool,
    ) -> Option<T> {
        match self.cache.peek::<T>(collection, key).await {
            Ok(entry) => entry.map(|e| {
                debug!(key = %key, created_at = %e.created_at, "cached document found");
                e.payload
            }),
            Err(e) => {
                if count_errors {
                    self.cache.record_error();
                }
                warn!(key = %key, collection = collection.name(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Run `generate` and write its result on a separate task. The task
    /// keeps running if the caller is dropped.
    async fn generate_and_persist<T, F>(
        &self,
        collection: Collection,
        key: &CacheKey,
        flight: Option<OwnedMutexGuard<()>>,
        generate: F,
    ) -> Result<T>
    where
        T: Serialize + Send + Sync + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        let key = key.clone();
        let task = tokio::spawn(
            async move {
                // released only once the document is written
                let _flight = flight;
                let payload = generate.await?;
                persist(&cache, collection, &key, &payload).await;
                Ok::<T, Error>(payload)
            }
            .in_current_span(),
        );
        task.await.map_err(|e| {
            Error::provider_with_context(
                format!("generation task failed: {}", e),
                ErrorContext::new().with_source("service"),
            )
        })?
    }
}

async fn persist<T: Serialize>(
    cache: &CacheManager,
    collection: Collection,
    key: &CacheKey,
    payload: &T,
) {
    match cache.put(collection, key, payload).await {
        Ok(()) => debug!(key = %key, collection = collection.name(), "cached"),
        Err(e) => {
            warn!(key = %key, collection = collection.name(), error = %e, "cache write failed, serving uncached")
        }
    }
}
