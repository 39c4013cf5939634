//! Deck request and flashcard record types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Image value stored for a card whose image generation failed.
pub const NO_IMAGE: &str = "no-image";

/// Deck difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
        }
    }

    /// Short guidance for the text prompt.
    pub fn vocabulary_hint(&self) -> &'static str {
        match self {
            Self::Beginner => "very common, everyday words a new learner meets first",
            Self::Intermediate => "useful words for conversations beyond the basics",
            Self::Expert => "less common, nuanced or idiomatic vocabulary",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Beginner" => Ok(Self::Beginner),
            "Intermediate" => Ok(Self::Intermediate),
            "Expert" => Ok(Self::Expert),
            other => Err(Error::validation(
                "difficulty",
                format!(
                    "unknown difficulty '{}', expected Beginner, Intermediate or Expert",
                    other
                ),
            )),
        }
    }
}

/// A validated request for one deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckRequest {
    pub source_language_name: String,
    pub target_language_name: String,
    pub difficulty: Difficulty,
}

impl DeckRequest {
    pub fn new(
        source_language_name: impl Into<String>,
        target_language_name: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            source_language_name: source_language_name.into(),
            target_language_name: target_language_name.into(),
            difficulty,
        }
    }
}

/// Grammatical category of a card's word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrammaticalType {
    Noun,
    Verb,
    Adjective,
    Other,
}

impl GrammaticalType {
    /// Map a free-form provider label onto the closed set.
    ///
    /// Unrecognized labels become [`GrammaticalType::Other`].
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "noun" => Self::Noun,
            "verb" => Self::Verb,
            "adjective" => Self::Adjective,
            _ => Self::Other,
        }
    }
}

/// Card text as returned by the provider, before images are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardText {
    pub word: String,
    pub translation: String,
    /// Raw label from the provider; normalized when the card is assembled.
    pub grammatical_type: String,
    pub example_sentence: String,
}

/// A complete flashcard as served and cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardRecord {
    pub word: String,
    pub translation: String,
    pub grammatical_type: GrammaticalType,
    pub example_sentence: String,
    /// Data URL of the card icon, or [`NO_IMAGE`].
    pub image: String,
}

impl FlashcardRecord {
    pub fn from_text(text: CardText, image: Option<String>) -> Self {
        Self {
            grammatical_type: GrammaticalType::normalize(&text.grammatical_type),
            word: text.word,
            translation: text.translation,
            example_sentence: text.example_sentence,
            image: image.unwrap_or_else(|| NO_IMAGE.to_string()),
        }
    }

    pub fn has_image(&self) -> bool {
        self.image != NO_IMAGE
    }
}

/// Cached deck document payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckPayload {
    pub cards: Vec<FlashcardRecord>,
}
