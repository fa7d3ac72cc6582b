//! # litrev Server
//!
//! HTTP front end for the review relay.
//!
//! Handles:
//! - the `POST /api/literature-review` endpoint with axum
//! - mapping relay errors to HTTP statuses with an `{ "error": ... }` body
//! - REST-specific concerns (JSON bodies, CORS, request tracing)

#![warn(rust_2018_idioms)]

mod error;

pub use error::ApiError;

use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use litrev_core::{ReviewRelay, ReviewRequest, REVIEW_PATH};

/// Application state shared across handlers
///
/// The relay is immutable and cheap to clone, so each request gets its own
/// handle with no locking.
#[derive(Clone)]
struct AppState {
    relay: ReviewRelay,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Build the router serving the review endpoint
pub fn router(relay: ReviewRelay) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(REVIEW_PATH, post(literature_review))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { relay })
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(addr: &str, relay: ReviewRelay) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- litrev listening on {}", listener.local_addr()?);

    axum::serve(listener, router(relay))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
}

/// Health check endpoint
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "litrev is alive".into(),
    })
}

/// Generate a literature review
///
/// The body is taken as raw bytes so malformed JSON is reported through the
/// same `{ "error": ... }` contract as every other failure.
///
/// # Returns
/// * `Ok(Json<Value>)` - The generator's payload, unmodified
/// * `Err(ApiError)` - 400 for bad input, 500/504 for relay failures
async fn literature_review(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request = ReviewRequest::from_slice(&body)?;
    let review = state.relay.handle(request).await?;
    Ok(Json(review))
}
