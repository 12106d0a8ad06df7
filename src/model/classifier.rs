//! Classifier capability and the adapter the scoring path talks to

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::features::TransactionFeatures;
use super::ModelFormat;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("model columns {found:?} do not match the expected layout {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{0} support is not compiled in")]
    Unsupported(&'static str),

    #[error("inference failed: {0}")]
    Runtime(String),

    #[error("classifier returned an invalid probability: {0}")]
    InvalidProbability(f64),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Metadata about the loaded artifact
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub format: ModelFormat,
    pub path: String,
    pub loaded_at: DateTime<Utc>,
}

/// Pre-trained binary classifier. Implementations consume features in the
/// canonical layout order and are never mutated after load.
pub trait Classifier: Send + Sync {
    /// `[p_negative, p_positive]`
    fn predict_proba(&self, features: &TransactionFeatures) -> Result<[f64; 2], InferenceError>;

    /// Hard class, 1 for fraudulent
    fn predict(&self, features: &TransactionFeatures) -> Result<u8, InferenceError> {
        let [_, positive] = self.predict_proba(features)?;
        Ok(u8::from(positive >= 0.5))
    }

    fn info(&self) -> ModelInfo;
}

// ============================================================================
// ADAPTER
// ============================================================================

/// Shared, read-only handle around the process-wide classifier
#[derive(Clone)]
pub struct ClassifierAdapter {
    inner: Arc<dyn Classifier>,
}

impl ClassifierAdapter {
    pub fn new(inner: Arc<dyn Classifier>) -> Self {
        Self { inner }
    }

    /// Probability of the fraudulent class, checked to lie in [0, 1]
    pub fn score(&self, features: &TransactionFeatures) -> Result<f64, InferenceError> {
        let [_, positive] = self.inner.predict_proba(features)?;

        if !positive.is_finite() || !(0.0..=1.0).contains(&positive) {
            return Err(InferenceError::InvalidProbability(positive));
        }

        Ok(positive)
    }

    pub fn info(&self) -> ModelInfo {
        self.inner.info()
    }
}
