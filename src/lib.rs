//! Fraudscore - Transaction fraud scoring service
//!
//! Scores one card transaction per request and records the outcome.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          FRAUDSCORE                           │
//! ├───────────────────────────────────────────────────────────────┤
//! │  POST /predict (Axum)                                         │
//! │        │                                                      │
//! │        ▼                                                      │
//! │  ┌───────────┐   ┌────────────┐   ┌──────────┐               │
//! │  │ Features  │──▶│ Classifier │──▶│ Decision │               │
//! │  │ (builder) │   │ (linear /  │   │ (policy) │               │
//! │  └───────────┘   │   onnx)    │   └────┬─────┘               │
//! │                  └────────────┘        ▼                      │
//! │                           ┌──────────────────────────┐        │
//! │                           │ Record store             │        │
//! │                           │ (PostgreSQL / CSV / mem) │        │
//! │                           └──────────────────────────┘        │
//! └───────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod decision;
pub mod error;
pub mod features;
pub mod handlers;
pub mod model;
pub mod scoring;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};
use scoring::ScoringService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scoring: ScoringService,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
