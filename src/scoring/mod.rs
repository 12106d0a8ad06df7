//! Scoring pipeline
//!
//! One request runs strictly in order:
//!
//! ```text
//! Received ─▶ Validated ─▶ Scored ─▶ Labeled ─▶ Persisted ─▶ Responded
//!    │            │           │                    │
//!    └────────────┴───────────┴──── Error ◀────────┘
//! ```
//!
//! Nothing is retried. The classifier and the store are the only state
//! shared between requests.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn, Instrument};

use crate::decision::{Decision, DecisionPolicy, Label, RiskTier};
use crate::features::{RawTransaction, TransactionFeatures, ValidationError};
use crate::model::{ClassifierAdapter, InferenceError, ModelInfo};
use crate::store::{ScoredTransaction, StoreError, TransactionStore};

#[cfg(test)]
mod tests;

// ============================================================================
// TYPES
// ============================================================================

/// How a store failure affects the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceMode {
    /// Store failure fails the request
    #[default]
    Strict,
    /// Store failure is logged; the score is still returned
    BestEffort,
}

impl FromStr for PersistenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(PersistenceMode::Strict),
            "best_effort" | "best-effort" => Ok(PersistenceMode::BestEffort),
            other => Err(format!("expected strict or best_effort, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoringStage {
    Received,
    Validated,
    Scored,
    Labeled,
    Persisted,
    Responded,
}

impl fmt::Display for ScoringStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("model inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("failed to record transaction: {0}")]
    Persistence(#[from] StoreError),
}

impl ScoringError {
    /// Last stage reached before the failure
    pub fn stage(&self) -> ScoringStage {
        match self {
            ScoringError::Validation(_) => ScoringStage::Received,
            ScoringError::Inference(_) => ScoringStage::Validated,
            ScoringError::Persistence(_) => ScoringStage::Labeled,
        }
    }
}

/// Result of scoring one transaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringResult {
    /// Unrounded classifier probability; the label is derived from this
    pub probability: f64,
    pub label: Label,
    pub tier: RiskTier,
}

impl ScoringResult {
    fn new(probability: f64, decision: Decision) -> Self {
        Self {
            probability,
            label: decision.label,
            tier: decision.tier,
        }
    }

    pub fn rounded_probability(&self) -> f64 {
        round2(self.probability)
    }

    pub fn recommendation(&self) -> &'static str {
        self.tier.recommendation()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutcome {
    pub result: ScoringResult,
    /// `None` only when a best-effort write failed
    pub record_id: Option<i64>,
}

/// Two decimals, ties to even
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

// ============================================================================
// SERVICE
// ============================================================================

#[derive(Clone)]
pub struct ScoringService {
    classifier: ClassifierAdapter,
    store: Arc<dyn TransactionStore>,
    policy: DecisionPolicy,
    persistence: PersistenceMode,
}

impl ScoringService {
    pub fn new(
        classifier: ClassifierAdapter,
        store: Arc<dyn TransactionStore>,
        policy: DecisionPolicy,
        persistence: PersistenceMode,
    ) -> Self {
        Self {
            classifier,
            store,
            policy,
            persistence,
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        self.classifier.info()
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn policy(&self) -> DecisionPolicy {
        self.policy
    }

    /// Run the full pipeline for one request
    pub async fn score(&self, raw: &RawTransaction) -> Result<ScoringOutcome, ScoringError> {
        let span = tracing::info_span!("score", record_id = tracing::field::Empty);

        let outcome = self.run(raw).instrument(span).await;

        if let Err(err) = &outcome {
            match err {
                ScoringError::Validation(e) => {
                    warn!(stage = %err.stage(), error = %e, "Rejected transaction")
                }
                _ => error!(stage = %err.stage(), error = %err, "Scoring failed"),
            }
        }

        outcome
    }

    async fn run(&self, raw: &RawTransaction) -> Result<ScoringOutcome, ScoringError> {
        debug!(stage = %ScoringStage::Received, fields = raw.len());

        let features = TransactionFeatures::build(raw)?;
        debug!(stage = %ScoringStage::Validated, category = %features.category);

        let probability = self.infer(features.clone()).await?;
        debug!(stage = %ScoringStage::Scored, probability);

        let result = ScoringResult::new(probability, self.policy.decide(probability));
        debug!(stage = %ScoringStage::Labeled, label = result.label.as_str(), tier = ?result.tier);

        let record_id = self.persist(features, &result).await?;
        if let Some(id) = record_id {
            tracing::Span::current().record("record_id", id);
            debug!(stage = %ScoringStage::Persisted, record_id = id);
        }

        info!(
            stage = %ScoringStage::Responded,
            prediction = result.label.as_str(),
            probability = result.rounded_probability(),
            "Transaction scored"
        );

        Ok(ScoringOutcome { result, record_id })
    }

    /// Inference is CPU-bound; keep it off the async workers
    async fn infer(&self, features: TransactionFeatures) -> Result<f64, InferenceError> {
        let classifier = self.classifier.clone();

        tokio::task::spawn_blocking(move || classifier.score(&features))
            .await
            .map_err(|e| InferenceError::Runtime(format!("inference task failed: {}", e)))?
    }

    async fn persist(
        &self,
        features: TransactionFeatures,
        result: &ScoringResult,
    ) -> Result<Option<i64>, StoreError> {
        let scored = ScoredTransaction {
            features,
            prediction: result.label,
            probability: result.rounded_probability(),
        };

        match self.store.append(scored).await {
            Ok(receipt) => Ok(Some(receipt.id)),
            Err(e) if self.persistence == PersistenceMode::BestEffort => {
                error!(error = %e, "Failed to record transaction, responding anyway");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
