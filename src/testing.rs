//! Test doubles shared by unit tests

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::features::{Category, RawTransaction, RawValue, TransactionFeatures};
use crate::model::{Classifier, InferenceError, ModelFormat, ModelInfo};
use crate::store::{RecordReceipt, ScoredTransaction, StoreError, TransactionStore};

/// The documented example transaction, as request fields
pub fn sample_raw() -> RawTransaction {
    let mut raw = RawTransaction::new();
    raw.insert("amt".into(), RawValue::Number(250.0));
    raw.insert("city_pop".into(), RawValue::Number(88000.0));
    raw.insert("lat".into(), RawValue::Number(40.71));
    raw.insert("long".into(), RawValue::Number(-74.00));
    raw.insert("merch_lat".into(), RawValue::Number(40.72));
    raw.insert("merch_long".into(), RawValue::Number(-73.99));
    raw.insert("unix_time".into(), RawValue::Number(1_700_000_000.0));
    raw.insert("category".into(), RawValue::from("shopping_net"));
    raw
}

pub fn sample_features() -> TransactionFeatures {
    TransactionFeatures {
        amount: 250.0,
        city_population: 88000.0,
        latitude: 40.71,
        longitude: -74.00,
        merchant_latitude: 40.72,
        merchant_longitude: -73.99,
        unix_timestamp: 1_700_000_000.0,
        category: Category::ShoppingNet,
    }
}

fn stub_info(name: &str) -> ModelInfo {
    ModelInfo {
        name: name.to_string(),
        format: ModelFormat::Linear,
        path: "<test>".to_string(),
        loaded_at: Utc::now(),
    }
}

/// Always returns the same positive-class probability; counts calls
pub struct FixedClassifier {
    probability: f64,
    calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for FixedClassifier {
    fn predict_proba(&self, _features: &TransactionFeatures) -> Result<[f64; 2], InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok([1.0 - self.probability, self.probability])
    }

    fn info(&self) -> ModelInfo {
        stub_info("fixed")
    }
}

/// Fails every call, as a model with an incompatible schema would
pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict_proba(&self, _features: &TransactionFeatures) -> Result<[f64; 2], InferenceError> {
        Err(InferenceError::Runtime("input shape mismatch".to_string()))
    }

    fn info(&self) -> ModelInfo {
        stub_info("failing")
    }
}

/// Rejects every write
pub struct FailingStore;

#[async_trait]
impl TransactionStore for FailingStore {
    async fn append(&self, _record: ScoredTransaction) -> Result<RecordReceipt, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
