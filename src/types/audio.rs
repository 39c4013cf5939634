//! Speech clip types.

use serde::{Deserialize, Serialize};

/// Cached speech clip payload; also the response body of `/fetchAudio`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPayload {
    /// Base64-encoded audio bytes as returned by the provider.
    pub audio_content: String,
}

impl AudioPayload {
    pub fn new(audio_content: impl Into<String>) -> Self {
        Self {
            audio_content: audio_content.into(),
        }
    }
}
