//! Prompt templates and the structured-output schema for deck text.

use serde_json::{json, Value};

use crate::types::DeckRequest;

/// Number of cards requested per deck. Not enforced on the response.
pub const CARDS_PER_DECK: usize = 10;

pub fn deck_prompt(request: &DeckRequest) -> String {
    format!(
        "Create {count} vocabulary flashcards for a {difficulty} learner whose native \
         language is {source} and who is learning {target}. Choose {hint}. For each card \
         give the word in {target}, its translation in {source}, its grammatical type \
         (noun, verb, adjective or other) and a short example sentence in {target} that \
         uses the word.",
        count = CARDS_PER_DECK,
        difficulty = request.difficulty.as_str().to_lowercase(),
        source = request.source_language_name,
        target = request.target_language_name,
        hint = request.difficulty.vocabulary_hint(),
    )
}

/// Response schema matching [`crate::types::CardText`].
pub fn deck_response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "word": { "type": "STRING" },
                "translation": { "type": "STRING" },
                "grammaticalType": {
                    "type": "STRING",
                    "enum": ["noun", "verb", "adjective", "other"]
                },
                "exampleSentence": { "type": "STRING" }
            },
            "required": ["word", "translation", "grammaticalType", "exampleSentence"],
            "propertyOrdering": ["word", "translation", "grammaticalType", "exampleSentence"]
        }
    })
}

pub fn image_prompt(word: &str) -> String {
    format!(
        "A simple, colorful flat icon illustrating the word \"{}\". \
         Centered on a plain background, no text or letters.",
        word
    )
}

pub fn speech_prompt(text: &str) -> String {
    format!("Say clearly, at a pace suited to a language learner: {}", text)
}
