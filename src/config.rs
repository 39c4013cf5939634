//! Server configuration, read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `FLASHDECK_BIND_ADDR` | `127.0.0.1` |
//! | `FLASHDECK_PORT` | `8080` |
//! | `FLASHDECK_DB_PATH` | `flashdeck.sqlite3` |
//! | `GEMINI_API_KEY` | required by the Gemini provider |
//! | `FLASHDECK_GEMINI_BASE_URL` | provider default |
//! | `FLASHDECK_TEXT_MODEL` / `FLASHDECK_IMAGE_MODEL` / `FLASHDECK_SPEECH_MODEL` | provider defaults |
//! | `FLASHDECK_VOICE` | provider default |
//! | `FLASHDECK_PROVIDER_TIMEOUT_SECS` | `60` |
//! | `FLASHDECK_FANOUT_MAX_CONCURRENCY` | `0` (unbounded) |
//! | `FLASHDECK_IMAGE_TIMEOUT_SECS` | unset (no per-image limit) |
//! | `FLASHDECK_AUDIO_KEY_SCHEME` | `digest` |
//! | `FLASHDECK_SINGLE_FLIGHT` | `true` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::AudioKeyScheme;
use crate::fanout::{FanOutConfig, FanOutStrategy};
use crate::provider::GeminiProviderBuilder;
use crate::service::ServiceConfig;
use crate::{Error, ErrorContext, Result};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub gemini: GeminiConfig,
    pub fan_out_max_concurrency: usize,
    pub image_timeout: Option<Duration>,
    pub audio_key_scheme: AudioKeyScheme,
    pub single_flight: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub speech_model: Option<String>,
    pub voice: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            db_path: PathBuf::from("flashdeck.sqlite3"),
            gemini: GeminiConfig {
                timeout_secs: 60,
                ..Default::default()
            },
            fan_out_max_concurrency: 0,
            image_timeout: None,
            audio_key_scheme: AudioKeyScheme::Digest,
            single_flight: true,
        }
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>>
    where
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid value '{}': {}", raw, e),
                    ErrorContext::new().with_field_path(name),
                )
            }),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by any `FLASHDECK_*` / `GEMINI_API_KEY` variables set.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Same as [`ServerConfig::from_env`], reading variables through `lookup`.
    /// Blank values count as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars { lookup };
        let defaults = Self::default();
        let config = Self {
            bind_addr: vars.get("FLASHDECK_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: vars.parse("FLASHDECK_PORT")?.unwrap_or(defaults.port),
            db_path: vars
                .get("FLASHDECK_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            gemini: GeminiConfig {
                api_key: vars.get("GEMINI_API_KEY"),
                base_url: vars.get("FLASHDECK_GEMINI_BASE_URL"),
                text_model: vars.get("FLASHDECK_TEXT_MODEL"),
                image_model: vars.get("FLASHDECK_IMAGE_MODEL"),
                speech_model: vars.get("FLASHDECK_SPEECH_MODEL"),
                voice: vars.get("FLASHDECK_VOICE"),
                timeout_secs: vars
                    .parse("FLASHDECK_PROVIDER_TIMEOUT_SECS")?
                    .unwrap_or(defaults.gemini.timeout_secs),
            },
            fan_out_max_concurrency: vars
                .parse("FLASHDECK_FANOUT_MAX_CONCURRENCY")?
                .unwrap_or(defaults.fan_out_max_concurrency),
            image_timeout: vars
                .parse::<u64>("FLASHDECK_IMAGE_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            audio_key_scheme: vars
                .parse("FLASHDECK_AUDIO_KEY_SCHEME")?
                .unwrap_or(defaults.audio_key_scheme),
            single_flight: vars
                .parse("FLASHDECK_SINGLE_FLIGHT")?
                .unwrap_or(defaults.single_flight),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.is_empty() {
            return Err(Error::configuration_with_context(
                "Bind address cannot be empty",
                ErrorContext::new().with_field_path("FLASHDECK_BIND_ADDR"),
            ));
        }
        if self.port == 0 {
            return Err(Error::configuration_with_context(
                "Port cannot be 0",
                ErrorContext::new().with_field_path("FLASHDECK_PORT"),
            ));
        }
        if self.gemini.timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "Provider timeout cannot be 0",
                ErrorContext::new().with_field_path("FLASHDECK_PROVIDER_TIMEOUT_SECS"),
            ));
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn service_config(&self) -> ServiceConfig {
        let mut fan_out = FanOutConfig::new()
            .with_strategy(FanOutStrategy::from_limit(self.fan_out_max_concurrency));
        if let Some(t) = self.image_timeout {
            fan_out = fan_out.with_item_timeout(t);
        }
        ServiceConfig::new()
            .with_audio_key_scheme(self.audio_key_scheme)
            .with_single_flight(self.single_flight)
            .with_fan_out(fan_out)
    }

    pub fn provider_builder(&self) -> GeminiProviderBuilder {
        let g = &self.gemini;
        let mut builder = GeminiProviderBuilder::new().timeout_secs(g.timeout_secs);
        if let Some(ref key) = g.api_key {
            builder = builder.api_key(key);
        }
        if let Some(ref url) = g.base_url {
            builder = builder.base_url(url);
        }
        if let Some(ref m) = g.text_model {
            builder = builder.text_model(m);
        }
        if let Some(ref m) = g.image_model {
            builder = builder.image_model(m);
        }
        if let Some(ref m) = g.speech_model {
            builder = builder.speech_model(m);
        }
        if let Some(ref v) = g.voice {
            builder = builder.voice(v);
        }
        builder
    }
}
