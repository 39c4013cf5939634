//! 扇出模块：为每张卡片并发生成图像并按原顺序组装卡组。
//!
//! # Fan-out Coordinator
//!
//! Turns the provider's card texts into complete [`FlashcardRecord`]s by
//! requesting one image per card concurrently.
//!
//! - Every image call is awaited; one failure never cancels the others.
//! - A failed or timed-out image becomes [`NO_IMAGE`].
//! - Output order is input order, regardless of completion order.
//!
//! ## Strategies
//!
//! - **Unbounded**: launch all calls at once
//! - **Bounded**: at most `max_concurrency` calls in flight (for rate-limited providers)

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::provider::GenerationProvider;
use crate::types::{CardText, FlashcardRecord, NO_IMAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOutStrategy {
    #[default]
    Unbounded,
    Bounded { max_concurrency: usize },
}

impl FanOutStrategy {
    /// `0` means unbounded.
    pub fn from_limit(max_concurrency: usize) -> Self {
        if max_concurrency == 0 {
            Self::Unbounded
        } else {
            Self::Bounded { max_concurrency }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FanOutConfig {
    pub strategy: FanOutStrategy,
    /// Upper bound for a single image call.
    pub item_timeout: Option<Duration>,
}

impl FanOutConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_strategy(mut self, s: FanOutStrategy) -> Self {
        self.strategy = s;
        self
    }
    pub fn with_item_timeout(mut self, t: Duration) -> Self {
        self.item_timeout = Some(t);
        self
    }
}

#[derive(Clone)]
pub struct DeckAssembler {
    provider: Arc<dyn GenerationProvider>,
    config: FanOutConfig,
}

impl DeckAssembler {
    pub fn new(provider: Arc<dyn GenerationProvider>, config: FanOutConfig) -> Self {
        Self { provider, config }
    }

    /// Attach an image to every card. Never fails.
    pub async fn assemble_deck(&self, cards: Vec<CardText>) -> Vec<FlashcardRecord> {
        let start = Instant::now();
        let total = cards.len();

        let calls: Vec<_> = cards
            .iter()
            .enumerate()
            .map(|(i, card)| self.image_for(i, card.word.clone()))
            .collect();
        let images: Vec<Option<String>> = match self.config.strategy {
            FanOutStrategy::Unbounded => join_all(calls).await,
            FanOutStrategy::Bounded { max_concurrency } => {
                // `buffered` yields in submission order
                stream::iter(calls)
                    .buffered(max_concurrency.max(1))
                    .collect()
                    .await
            }
        };

        let failed = images.iter().filter(|img| img.is_none()).count();
        debug!(
            total,
            failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "deck images settled"
        );

        cards
            .into_iter()
            .zip(images)
            .map(|(text, image)| FlashcardRecord::from_text(text, image))
            .collect()
    }

    async fn image_for(&self, index: usize, word: String) -> Option<String> {
        let call = self.provider.generate_image(&word);
        let result = match self.config.item_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(index, word = %word, timeout_ms = limit.as_millis() as u64, "image generation timed out, using {}", NO_IMAGE);
                    return None;
                }
            },
            None => call.await,
        };
        match result {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(index, word = %word, error = %e, "image generation failed, using {}", NO_IMAGE);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeckRequest;
    use crate::{Error, ErrorContext, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails for words starting with "x"; sleeps longer for earlier words so
    /// completion order is the reverse of submission order.
    struct ReversingImages {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ReversingImages {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for ReversingImages {
        async fn generate_deck_text(&self, _: &DeckRequest) -> Result<Vec<CardText>> {
            Ok(Vec::new())
        }
        async fn generate_image(&self, word: &str) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let delay: u64 = word.trim_start_matches(|c: char| !c.is_ascii_digit()).parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50 - delay * 10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if word.starts_with('x') {
                Err(Error::provider_with_context("blocked", ErrorContext::new()))
            } else {
                Ok(format!("data:image/png;base64,{}", word))
            }
        }
        async fn generate_speech_audio(&self, _: &str) -> Result<String> {
            Ok(String::new())
        }
        fn name(&self) -> &'static str {
            "reversing"
        }
    }

    fn card(word: &str) -> CardText {
        CardText {
            word: word.into(),
            translation: format!("t-{}", word),
            grammatical_type: "noun".into(),
            example_sentence: String::new(),
        }
    }

    #[tokio::test]
    async fn test_order_preserved_and_failures_degrade() {
        let assembler = DeckAssembler::new(Arc::new(ReversingImages::new()), FanOutConfig::new());
        let cards = vec![card("w0"), card("x1"), card("w2"), card("x3"), card("w4")];
        let deck = assembler.assemble_deck(cards).await;

        assert_eq!(deck.len(), 5);
        let words: Vec<_> = deck.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, ["w0", "x1", "w2", "x3", "w4"]);
        assert_eq!(deck[0].image, "data:image/png;base64,w0");
        assert_eq!(deck[1].image, NO_IMAGE);
        assert_eq!(deck[3].image, NO_IMAGE);
        assert_eq!(deck[4].image, "data:image/png;base64,w4");
    }

    #[tokio::test]
    async fn test_bounded_strategy_caps_in_flight() {
        let provider = Arc::new(ReversingImages::new());
        let config = FanOutConfig::new().with_strategy(FanOutStrategy::Bounded { max_concurrency: 2 });
        let assembler = DeckAssembler::new(provider.clone(), config);
        let cards: Vec<_> = (0..5).map(|i| card(&format!("w{}", i))).collect();

        let deck = assembler.assemble_deck(cards).await;
        assert_eq!(deck.len(), 5);
        assert!(deck.iter().all(|c| c.has_image()));
        assert!(provider.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(deck[2].word, "w2");
    }

    #[tokio::test]
    async fn test_unbounded_launches_all_at_once() {
        let provider = Arc::new(ReversingImages::new());
        let assembler = DeckAssembler::new(provider.clone(), FanOutConfig::new());
        let cards: Vec<_> = (0..4).map(|i| card(&format!("w{}", i))).collect();
        assembler.assemble_deck(cards).await;
        assert_eq!(provider.peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_item_timeout_uses_sentinel() {
        let config = FanOutConfig::new().with_item_timeout(Duration::from_millis(25));
        let assembler = DeckAssembler::new(Arc::new(ReversingImages::new()), config);
        // w0 sleeps 50ms, w4 sleeps 10ms
        let deck = assembler.assemble_deck(vec![card("w0"), card("w4")]).await;
        assert_eq!(deck[0].image, NO_IMAGE);
        assert!(deck[1].has_image());
    }

    #[tokio::test]
    async fn test_empty_deck() {
        let assembler = DeckAssembler::new(Arc::new(ReversingImages::new()), FanOutConfig::new());
        assert!(assembler.assemble_deck(Vec::new()).await.is_empty());
    }

    #[test]
    fn test_strategy_from_limit() {
        assert_eq!(FanOutStrategy::from_limit(0), FanOutStrategy::Unbounded);
        assert_eq!(
            FanOutStrategy::from_limit(3),
            FanOutStrategy::Bounded { max_concurrency: 3 }
        );
    }
}
