//! Gemini API client.
//!
//! - Deck text: `generateContent` with a JSON response schema.
//! - Images: Imagen `predict`, returned as a data URL.
//! - Speech: `generateContent` with the AUDIO response modality.
//!
//! The API key is passed as the `key` query parameter.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::prompt::{deck_prompt, deck_response_schema, image_prompt, speech_prompt};
use super::GenerationProvider;
use crate::types::{CardText, DeckRequest};
use crate::{Error, ErrorContext, Result};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
const DEFAULT_VOICE: &str = "Kore";

pub struct GeminiProvider {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
    speech_model: String,
    voice: String,
}

impl GeminiProvider {
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    async fn post(&self, model: &str, method: &str, body: &Value, source: &str) -> Result<Value> {
        let endpoint = format!(
            "{}/v1beta/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            model,
            method
        );
        let response = self
            .http_client
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::Remote {
                status: status.as_u16(),
                message: format!("{}: {}", source, text.chars().take(200).collect::<String>()),
            });
        }
        debug!(source, model, status = status.as_u16(), bytes = text.len(), "provider call succeeded");
        Ok(serde_json::from_str(&text)?)
    }
}

fn malformed(source: &str, what: &str) -> Error {
    Error::provider_with_context(
        format!("malformed provider response: {}", what),
        ErrorContext::new().with_source(source),
    )
}

/// Reject payloads that would not decode on the client.
fn ensure_base64<'a>(data: &'a str, source: &str) -> Result<&'a str> {
    STANDARD
        .decode(data)
        .map(|_| data)
        .map_err(|e| malformed(source, &format!("payload is not base64: {}", e)))
}

/// First content part of the first candidate.
fn first_part<'a>(response: &'a Value, source: &str) -> Result<&'a Value> {
    response
        .pointer("/candidates/0/content/parts/0")
        .ok_or_else(|| malformed(source, "no candidate content"))
}

fn decode_deck_text(response: &Value) -> Result<Vec<CardText>> {
    let text = first_part(response, "gemini.text")?
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("gemini.text", "candidate has no text part"))?;
    serde_json::from_str(text).map_err(|e| {
        Error::provider_with_context(
            format!("deck text is not a card array: {}", e),
            ErrorContext::new().with_source("gemini.text"),
        )
    })
}

fn decode_image(response: &Value) -> Result<String> {
    let prediction = response
        .pointer("/predictions/0")
        .ok_or_else(|| malformed("gemini.image", "no predictions"))?;
    let data = prediction
        .get("bytesBase64Encoded")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("gemini.image", "prediction has no image bytes"))?;
    let data = ensure_base64(data, "gemini.image")?;
    let mime = prediction
        .get("mimeType")
        .and_then(Value::as_str)
        .unwrap_or("image/png");
    Ok(format!("data:{};base64,{}", mime, data))
}

fn decode_speech(response: &Value) -> Result<String> {
    let data = first_part(response, "gemini.speech")?
        .pointer("/inlineData/data")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("gemini.speech", "candidate has no inline audio"))?;
    ensure_base64(data, "gemini.speech").map(str::to_string)
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate_deck_text(&self, request: &DeckRequest) -> Result<Vec<CardText>> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": deck_prompt(request) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": deck_response_schema(),
            }
        });
        let response = self
            .post(&self.text_model, "generateContent", &body, "gemini.text")
            .await?;
        decode_deck_text(&response)
    }

    async fn generate_image(&self, word: &str) -> Result<String> {
        let body = json!({
            "instances": [{ "prompt": image_prompt(word) }],
            "parameters": { "sampleCount": 1, "aspectRatio": "1:1" }
        });
        let response = self
            .post(&self.image_model, "predict", &body, "gemini.image")
            .await?;
        decode_image(&response)
    }

    async fn generate_speech_audio(&self, text: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": speech_prompt(text) }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": self.voice } }
                }
            }
        });
        let response = self
            .post(&self.speech_model, "generateContent", &body, "gemini.speech")
            .await?;
        decode_speech(&response)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    text_model: Option<String>,
    image_model: Option<String>,
    speech_model: Option<String>,
    voice: Option<String>,
    timeout_secs: u64,
}

impl GeminiProviderBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            text_model: None,
            image_model: None,
            speech_model: None,
            voice: None,
            timeout_secs: 60,
        }
    }
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = Some(model.into());
        self
    }
    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = Some(model.into());
        self
    }
    pub fn speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = Some(model.into());
        self
    }
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
    /// Per-request timeout; a hung provider call fails after this long.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<GeminiProvider> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "API key required",
                    ErrorContext::new().with_field_path("GEMINI_API_KEY"),
                )
            })?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(GeminiProvider {
            http_client,
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            text_model: self.text_model.unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: self.image_model.unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            speech_model: self.speech_model.unwrap_or_else(|| DEFAULT_SPEECH_MODEL.to_string()),
            voice: self.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
        })
    }
}

impl Default for GeminiProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
