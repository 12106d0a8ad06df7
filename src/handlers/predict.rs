//! Scoring handler

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::header,
    Form, Json,
};
use serde::Serialize;

use crate::features::{RawTransaction, RawValue};
use crate::scoring::ScoringResult;
use crate::{AppError, AppResult, AppState};

/// Request fields from either a JSON object or a form-encoded body
#[derive(Debug)]
pub struct TransactionFields(pub RawTransaction);

#[async_trait]
impl<S> FromRequest<S> for TransactionFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<serde_json::Map<String, serde_json::Value>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            Ok(Self(
                body.into_iter()
                    .map(|(key, value)| (key, RawValue::from(value)))
                    .collect(),
            ))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(body) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            Ok(Self(
                body.into_iter()
                    .map(|(key, value)| (key, RawValue::Text(value)))
                    .collect(),
            ))
        } else {
            Err(AppError::BadRequest(
                "Expected a JSON or form-encoded request body".to_string(),
            ))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: &'static str,
    pub probability: f64,
    pub recommendation: &'static str,
}

impl From<&ScoringResult> for PredictResponse {
    fn from(result: &ScoringResult) -> Self {
        Self {
            prediction: result.label.as_str(),
            probability: result.rounded_probability(),
            recommendation: result.recommendation(),
        }
    }
}

/// Score one transaction
pub async fn predict(
    State(state): State<AppState>,
    TransactionFields(fields): TransactionFields,
) -> AppResult<Json<PredictResponse>> {
    let outcome = state.scoring.score(&fields).await?;
    Ok(Json(PredictResponse::from(&outcome.result)))
}
