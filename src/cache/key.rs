//! Cache key derivation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

use crate::types::Difficulty;
use crate::{Error, Result};

const DECK_PREFIX: &str = "deck";
const AUDIO_PREFIX: &str = "audio";
/// Length limit of the normalized text in [`AudioKeyScheme::Truncated`] keys.
pub const TRUNCATED_AUDIO_TEXT_LEN: usize = 100;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Identifier of one document in the cache store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// How speech clip keys are derived from their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioKeyScheme {
    /// `audio_` + SHA-256 hex digest of the full text.
    #[default]
    Digest,
    /// `audio_` + the first 100 chars of the text with every char outside
    /// `[A-Za-z0-9]` replaced by `_`. Texts sharing that prefix share a key;
    /// kept for stores populated with this layout.
    Truncated,
}

impl AudioKeyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digest => "digest",
            Self::Truncated => "truncated",
        }
    }
}

impl FromStr for AudioKeyScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "digest" | "sha256" => Ok(Self::Digest),
            "truncated" | "legacy" => Ok(Self::Truncated),
            other => Err(Error::configuration(format!(
                "unknown audio key scheme '{}', expected 'digest' or 'truncated'",
                other
            ))),
        }
    }
}

/// Key for a (source, target, difficulty) deck, e.g. `deck_English_French_Beginner`.
///
/// Language names are taken verbatim, so the key is case-sensitive.
pub fn derive_deck_key(source: &str, target: &str, difficulty: Difficulty) -> CacheKey {
    let raw = format!("{}_{}_{}_{}", DECK_PREFIX, source, target, difficulty.as_str());
    CacheKey(WHITESPACE_RUN.replace_all(&raw, "_").into_owned())
}

/// Key for the speech clip of `text`.
pub fn derive_audio_key(text: &str, scheme: AudioKeyScheme) -> CacheKey {
    match scheme {
        AudioKeyScheme::Digest => {
            let digest = Sha256::digest(text.as_bytes());
            let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
            CacheKey(format!("{}_{}", AUDIO_PREFIX, hex))
        }
        AudioKeyScheme::Truncated => {
            let normalized: String = text
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .take(TRUNCATED_AUDIO_TEXT_LEN)
                .collect();
            CacheKey(format!("{}_{}", AUDIO_PREFIX, normalized))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_key_example() {
        let key = derive_deck_key("English", "French", Difficulty::Beginner);
        assert_eq!(key.as_str(), "deck_English_French_Beginner");
    }

    #[test]
    fn test_deck_key_deterministic_and_distinct() {
        let a = derive_deck_key("English", "French", Difficulty::Beginner);
        assert_eq!(a, derive_deck_key("English", "French", Difficulty::Beginner));
        assert_ne!(a, derive_deck_key("English", "French", Difficulty::Expert));
        assert_ne!(a, derive_deck_key("French", "English", Difficulty::Beginner));
        assert_ne!(a, derive_deck_key("English", "german", Difficulty::Beginner));
        // case is part of the identity
        assert_ne!(a, derive_deck_key("English", "french", Difficulty::Beginner));
    }

    #[test]
    fn test_deck_key_collapses_whitespace() {
        let key = derive_deck_key("Brazilian  Portuguese", "Old\tNorse", Difficulty::Expert);
        assert_eq!(key.as_str(), "deck_Brazilian_Portuguese_Old_Norse_Expert");
    }

    #[test]
    fn test_truncated_audio_key() {
        let key = derive_audio_key("Bonjour, le monde!", AudioKeyScheme::Truncated);
        assert_eq!(key.as_str(), "audio_Bonjour__le_monde_");

        let accented = derive_audio_key("café", AudioKeyScheme::Truncated);
        assert_eq!(accented.as_str(), "audio_caf_");
    }

    #[test]
    fn test_truncated_audio_key_collides_past_limit() {
        let prefix = "a".repeat(TRUNCATED_AUDIO_TEXT_LEN);
        let one = derive_audio_key(&format!("{}one", prefix), AudioKeyScheme::Truncated);
        let two = derive_audio_key(&format!("{}two", prefix), AudioKeyScheme::Truncated);
        assert_eq!(one, two);
        assert_eq!(one.as_str().len(), "audio_".len() + TRUNCATED_AUDIO_TEXT_LEN);
    }

    #[test]
    fn test_digest_audio_key_is_injective_past_limit() {
        let prefix = "a".repeat(TRUNCATED_AUDIO_TEXT_LEN);
        let one = derive_audio_key(&format!("{}one", prefix), AudioKeyScheme::Digest);
        let two = derive_audio_key(&format!("{}two", prefix), AudioKeyScheme::Digest);
        assert_ne!(one, two);
        assert_eq!(one.as_str().len(), "audio_".len() + 64);
        assert_eq!(one, derive_audio_key(&format!("{}one", prefix), AudioKeyScheme::Digest));
    }

    #[test]
    fn test_audio_key_scheme_from_str() {
        assert_eq!("digest".parse::<AudioKeyScheme>().unwrap(), AudioKeyScheme::Digest);
        assert_eq!("Truncated".parse::<AudioKeyScheme>().unwrap(), AudioKeyScheme::Truncated);
        assert!("md5".parse::<AudioKeyScheme>().is_err());
    }
}
