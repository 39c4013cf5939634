//! 生成服务模块：卡组文本、卡片图像与语音的生成接口。
//!
//! # Generation Provider Module
//!
//! The boundary between the cache-aside core and the generative AI provider.
//! The core only depends on [`GenerationProvider`]; [`GeminiProvider`] is the
//! HTTP implementation used by the server binary.
//!
//! Failure semantics seen by callers:
//! - [`GenerationProvider::generate_deck_text`] and
//!   [`GenerationProvider::generate_speech_audio`] failures are fatal for the
//!   current request.
//! - [`GenerationProvider::generate_image`] failures are recovered by the
//!   fan-out coordinator.

mod gemini;
mod prompt;

pub use gemini::{GeminiProvider, GeminiProviderBuilder};
pub use prompt::{deck_prompt, deck_response_schema, image_prompt, speech_prompt};

use async_trait::async_trait;

use crate::types::{CardText, DeckRequest};
use crate::Result;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Ordered card texts for one deck.
    async fn generate_deck_text(&self, request: &DeckRequest) -> Result<Vec<CardText>>;

    /// Icon for `word`, as a data URL.
    async fn generate_image(&self, word: &str) -> Result<String>;

    /// Spoken rendition of `text`, base64-encoded.
    async fn generate_speech_audio(&self, text: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}
