//! Gemini provider against a mock HTTP server.

use flashdeck::provider::{GeminiProvider, GenerationProvider};
use flashdeck::{DeckRequest, Difficulty, Error};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

fn provider(server: &ServerGuard) -> GeminiProvider {
    GeminiProvider::builder()
        .api_key("test-key")
        .base_url(server.url())
        .timeout_secs(5)
        .build()
        .unwrap()
}

fn key_query() -> Matcher {
    Matcher::UrlEncoded("key".into(), "test-key".into())
}

#[tokio::test]
async fn test_deck_text_is_decoded_from_candidate_json() {
    let mut server = Server::new_async().await;
    let cards = json!([
        {"word": "apple", "translation": "pomme", "grammaticalType": "noun", "exampleSentence": "I eat an apple."},
        {"word": "run", "translation": "courir", "grammaticalType": "verb", "exampleSentence": "I run."}
    ]);
    let body = json!({
        "candidates": [{ "content": { "parts": [{ "text": cards.to_string() }] } }]
    });
    let mock = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
        .match_query(key_query())
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let request = DeckRequest::new("English", "French", Difficulty::Beginner);
    let texts = provider(&server).generate_deck_text(&request).await.unwrap();
    mock.assert_async().await;
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0].word, "apple");
    assert_eq!(texts[1].translation, "courir");
}

#[tokio::test]
async fn test_image_is_returned_as_data_url() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/imagen-4.0-generate-001:predict")
        .match_query(key_query())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "predictions": [{ "bytesBase64Encoded": "iVBORw0K", "mimeType": "image/png" }] })
                .to_string(),
        )
        .create_async()
        .await;

    let image = provider(&server).generate_image("apple").await.unwrap();
    mock.assert_async().await;
    assert_eq!(image, "data:image/png;base64,iVBORw0K");
}

#[tokio::test]
async fn test_speech_returns_inline_audio() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash-preview-tts:generateContent")
        .match_query(key_query())
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": { "responseModalities": ["AUDIO"] }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{ "content": { "parts": [{
                    "inlineData": { "mimeType": "audio/L16;rate=24000", "data": "AAAA" }
                }] } }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let audio = provider(&server).generate_speech_audio("Bonjour").await.unwrap();
    mock.assert_async().await;
    assert_eq!(audio, "AAAA");
}

#[tokio::test]
async fn test_http_error_becomes_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1beta/models/imagen-4.0-generate-001:predict")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"error":{"message":"internal"}}"#)
        .create_async()
        .await;

    let err = provider(&server).generate_image("apple").await.unwrap_err();
    match err {
        Error::Remote { status, message } => {
            assert_eq!(status, 500);
            assert!(message.starts_with("gemini.image"));
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_candidates_is_provider_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash-preview-tts:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"candidates":[]}"#)
        .create_async()
        .await;

    let err = provider(&server).generate_speech_audio("Bonjour").await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
}
