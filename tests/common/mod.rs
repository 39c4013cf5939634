//! Shared fakes for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use flashdeck::cache::{CacheKey, CacheStore, Collection, MemoryStore};
use flashdeck::provider::GenerationProvider;
use flashdeck::types::{CardText, DeckRequest};
use flashdeck::{Error, ErrorContext, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn card(word: &str, grammatical_type: &str) -> CardText {
    CardText {
        word: word.to_string(),
        translation: format!("{}-fr", word),
        grammatical_type: grammatical_type.to_string(),
        example_sentence: format!("Here is {}.", word),
    }
}

pub fn sample_cards() -> Vec<CardText> {
    vec![
        card("apple", "noun"),
        card("run", "Verb"),
        card("quick", " ADJECTIVE "),
        card("slowly", "adverb"),
    ]
}

/// Scriptable provider that counts its calls.
#[derive(Default)]
pub struct FakeProvider {
    pub cards: Vec<CardText>,
    pub failing_images: HashSet<String>,
    pub fail_text: bool,
    pub fail_speech: bool,
    pub delay: Option<Duration>,
    pub text_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub speech_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn with_cards(cards: Vec<CardText>) -> Self {
        Self {
            cards,
            ..Default::default()
        }
    }

    pub fn failing_image(mut self, word: &str) -> Self {
        self.failing_images.insert(word.to_string());
        self
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn speech_calls(&self) -> usize {
        self.speech_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
    }
}

fn fake_failure(source: &str) -> Error {
    Error::provider_with_context("scripted failure", ErrorContext::new().with_source(source))
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn generate_deck_text(&self, _request: &DeckRequest) -> Result<Vec<CardText>> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_text {
            return Err(fake_failure("fake.text"));
        }
        Ok(self.cards.clone())
    }

    async fn generate_image(&self, word: &str) -> Result<String> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_images.contains(word) {
            return Err(fake_failure("fake.image"));
        }
        Ok(format!("data:image/png;base64,{}", word))
    }

    async fn generate_speech_audio(&self, text: &str) -> Result<String> {
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_speech {
            return Err(fake_failure("fake.speech"));
        }
        Ok(format!("pcm:{}", text.len()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Memory store whose reads and writes can be made to fail. Counts every call.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn store_failure() -> Error {
    Error::store_with_context("store unavailable", ErrorContext::new().with_source("flaky"))
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn exists(&self, collection: Collection, key: &CacheKey) -> Result<bool> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(store_failure());
        }
        self.inner.exists(collection, key).await
    }

    async fn get(&self, collection: Collection, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(store_failure());
        }
        self.inner.get(collection, key).await
    }

    async fn put(&self, collection: Collection, key: &CacheKey, data: &[u8]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(store_failure());
        }
        self.inner.put(collection, key, data).await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}
