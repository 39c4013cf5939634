//! HTTP 接口：`/fetchDeck` 与 `/fetchAudio`。
//!
//! # HTTP API
//!
//! | Route | Body | Response |
//! |-------|------|----------|
//! | `POST /fetchDeck` | `{"sourceLang","targetLang","difficulty"}` | JSON array of cards |
//! | `POST /fetchAudio` | `{"text"}` | `{"audioContent": "<base64>"}` |
//! | `GET /health` | none | store, provider and cache counters |
//!
//! Both POST routes set `x-cache: HIT|MISS`. Other methods on them get 405.
//! Missing input is a 400 with a plain-text message; generation failures are
//! a 500 with a fixed message.

mod error;
mod handlers;
mod types;

pub use error::ApiError;
pub use types::{FetchAudioBody, FetchDeckBody};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::FlashcardService;
use crate::Result;

/// Shared handler state.
pub struct AppState {
    pub service: Arc<FlashcardService>,
}

impl AppState {
    pub fn new(service: Arc<FlashcardService>) -> Self {
        Self { service }
    }
}

fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/fetchDeck", post(handlers::fetch_deck))
        .route("/fetchAudio", post(handlers::fetch_audio))
        .route("/health", get(handlers::health))
}

/// Build the application router with CORS and request tracing applied.
pub fn router(service: Arc<FlashcardService>) -> Router {
    create_routes()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(AppState::new(service)))
}

/// Serve `service` on `listener` until ctrl-c.
pub async fn serve(listener: tokio::net::TcpListener, service: Arc<FlashcardService>) -> Result<()> {
    let app = router(service);
    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }
    Ok(())
}
