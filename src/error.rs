//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::scoring::ScoringError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request body could not be read as fields
    BadRequest(String),

    // Field validation errors
    ValidationError(String),

    // Classifier errors
    InferenceError(String),

    // Record store errors
    PersistenceError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InferenceError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PersistenceError(msg) => {
                tracing::error!("Persistence error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to record the scored transaction".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));

        (status, body).into_response()
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::Validation(e) => AppError::ValidationError(e.to_string()),
            e @ ScoringError::Inference(_) => AppError::InferenceError(e.to_string()),
            e @ ScoringError::Persistence(_) => AppError::PersistenceError(e.to_string()),
        }
    }
}
