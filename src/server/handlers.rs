//! Route handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use super::error::ApiError;
use super::types::{FetchAudioBody, FetchDeckBody};
use super::AppState;
use crate::service::CacheStatus;
use crate::Error;

const CACHE_HEADER: HeaderName = HeaderName::from_static("x-cache");

/// An empty body decodes as `{}` so it reports the missing fields.
fn parse_body<T: DeserializeOwned + Default>(route: &str, body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        warn!(route, error = %e, "rejected malformed JSON body");
        ApiError::BadRequest(format!("Invalid JSON body: {}", e))
    })
}

fn reject(route: &str, err: Error) -> ApiError {
    let field = err
        .context()
        .and_then(|c| c.field_path.as_deref())
        .unwrap_or("body");
    warn!(route, field, error = %err, "rejected invalid request");
    ApiError::from_error(err, "Invalid request")
}

fn with_cache_header(status: CacheStatus, body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(CACHE_HEADER, HeaderValue::from_static(status.as_str()));
    response
}

/// `POST /fetchDeck`
pub async fn fetch_deck(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = parse_body::<FetchDeckBody>("/fetchDeck", &body)?
        .into_request()
        .map_err(|e| reject("/fetchDeck", e))?;

    let span = info_span!(
        "fetch_deck",
        request_id = %Uuid::new_v4(),
        source_lang = %request.source_language_name,
        target_lang = %request.target_language_name,
        difficulty = %request.difficulty,
    );
    let served = state
        .service
        .fetch_deck(&request)
        .instrument(span)
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to generate flashcards"))?;

    Ok(with_cache_header(served.cache, Json(served.payload)))
}

/// `POST /fetchAudio`
pub async fn fetch_audio(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let text = parse_body::<FetchAudioBody>("/fetchAudio", &body)?
        .into_text()
        .map_err(|e| reject("/fetchAudio", e))?;

    let span = info_span!(
        "fetch_audio",
        request_id = %Uuid::new_v4(),
        text_len = text.chars().count(),
    );
    let served = state
        .service
        .fetch_audio(&text)
        .instrument(span)
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to generate audio"))?;

    Ok(with_cache_header(served.cache, Json(served.payload)))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.service.cache_stats();
    let config = state.service.config();
    Json(serde_json::json!({
        "status": "ok",
        "store": state.service.store_name(),
        "provider": state.service.provider_name(),
        "audioKeyScheme": config.audio_key_scheme.as_str(),
        "singleFlight": config.single_flight,
        "cache": {
            "hits": stats.hits,
            "misses": stats.misses,
            "writes": stats.writes,
            "errors": stats.errors,
            "hitRatio": stats.hit_ratio(),
        }
    }))
}
