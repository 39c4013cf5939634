//! Request bodies of the HTTP API.

use serde::Deserialize;

use crate::types::{DeckRequest, Difficulty};
use crate::{Error, Result};

/// `POST /fetchDeck` body. Fields are optional here so that a missing field
/// is reported as a validation error rather than a decode failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchDeckBody {
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub difficulty: Option<String>,
}

/// `POST /fetchAudio` body.
#[derive(Debug, Default, Deserialize)]
pub struct FetchAudioBody {
    pub text: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::validation(field, format!("{} is required", field))),
    }
}

impl FetchDeckBody {
    pub fn into_request(self) -> Result<DeckRequest> {
        let source = required(self.source_lang, "sourceLang")?;
        let target = required(self.target_lang, "targetLang")?;
        let difficulty: Difficulty = required(self.difficulty, "difficulty")?.parse()?;
        Ok(DeckRequest::new(source, target, difficulty))
    }
}

impl FetchAudioBody {
    pub fn into_text(self) -> Result<String> {
        required(self.text, "text")
    }
}
