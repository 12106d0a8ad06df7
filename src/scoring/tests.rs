//! Pipeline tests with stub classifiers and stores

use std::sync::Arc;

use crate::decision::{DecisionPolicy, Label, RiskTier};
use crate::features::{RawValue, ValidationError};
use crate::model::ClassifierAdapter;
use crate::scoring::{PersistenceMode, ScoringError, ScoringResult, ScoringService, ScoringStage};
use crate::store::InMemoryTransactionStore;
use crate::testing::{
    sample_features, sample_raw, FailingClassifier, FailingStore, FixedClassifier,
};

fn service(
    classifier: Arc<FixedClassifier>,
    store: Arc<InMemoryTransactionStore>,
) -> ScoringService {
    ScoringService::new(
        ClassifierAdapter::new(classifier),
        store,
        DecisionPolicy::default(),
        PersistenceMode::Strict,
    )
}

#[tokio::test]
async fn test_end_to_end_example() {
    let classifier = Arc::new(FixedClassifier::new(0.92));
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = service(classifier.clone(), store.clone());

    let outcome = service.score(&sample_raw()).await.unwrap();

    assert_eq!(outcome.result.label, Label::Fraudulent);
    assert_eq!(outcome.result.rounded_probability(), 0.92);
    assert_eq!(outcome.result.tier, RiskTier::High);
    assert!(outcome.result.recommendation().starts_with("High risk"));
    assert_eq!(classifier.calls(), 1);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(Some(records[0].id), outcome.record_id);
    assert_eq!(records[0].features, sample_features());
    assert_eq!(records[0].prediction, Label::Fraudulent);
    assert_eq!(records[0].probability, 0.92);
}

#[tokio::test]
async fn test_probability_rounded_only_for_output() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = service(Arc::new(FixedClassifier::new(0.79996)), store.clone());

    let outcome = service.score(&sample_raw()).await.unwrap();

    // Label uses the raw value even though it rounds to 0.8
    assert_eq!(outcome.result.label, Label::NonFraudulent);
    assert_eq!(outcome.result.rounded_probability(), 0.8);
    assert_eq!(store.records()[0].probability, 0.8);
}

#[tokio::test]
async fn test_threshold_boundary() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = service(Arc::new(FixedClassifier::new(0.8)), store);

    let outcome = service.score(&sample_raw()).await.unwrap();
    assert_eq!(outcome.result.label, Label::Fraudulent);
    assert_eq!(outcome.result.tier, RiskTier::Medium);
}

#[tokio::test]
async fn test_missing_field_never_reaches_classifier() {
    let classifier = Arc::new(FixedClassifier::new(0.5));
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = service(classifier.clone(), store.clone());

    let mut raw = sample_raw();
    raw.remove("unix_time");

    let err = service.score(&raw).await.unwrap_err();
    assert!(matches!(
        err,
        ScoringError::Validation(ValidationError::MissingField { field: "unix_time" })
    ));
    assert_eq!(err.stage(), ScoringStage::Received);
    assert_eq!(classifier.calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unknown_category_never_reaches_classifier() {
    let classifier = Arc::new(FixedClassifier::new(0.5));
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = service(classifier.clone(), store.clone());

    let mut raw = sample_raw();
    raw.insert("category".into(), RawValue::from("crypto_net"));

    let err = service.score(&raw).await.unwrap_err();
    assert!(matches!(
        err,
        ScoringError::Validation(ValidationError::UnknownCategory { .. })
    ));
    assert_eq!(classifier.calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_inference_failure_records_nothing() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = ScoringService::new(
        ClassifierAdapter::new(Arc::new(FailingClassifier)),
        store.clone(),
        DecisionPolicy::default(),
        PersistenceMode::Strict,
    );

    let err = service.score(&sample_raw()).await.unwrap_err();
    assert!(matches!(err, ScoringError::Inference(_)));
    assert_eq!(err.stage(), ScoringStage::Validated);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_out_of_range_probability_is_inference_error() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = service(Arc::new(FixedClassifier::new(1.3)), store.clone());

    let err = service.score(&sample_raw()).await.unwrap_err();
    assert!(matches!(err, ScoringError::Inference(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_strict_persistence_failure_fails_request() {
    let service = ScoringService::new(
        ClassifierAdapter::new(Arc::new(FixedClassifier::new(0.3))),
        Arc::new(FailingStore),
        DecisionPolicy::default(),
        PersistenceMode::Strict,
    );

    let err = service.score(&sample_raw()).await.unwrap_err();
    assert!(matches!(err, ScoringError::Persistence(_)));
    assert_eq!(err.stage(), ScoringStage::Labeled);
}

#[tokio::test]
async fn test_best_effort_persistence_failure_still_responds() {
    let service = ScoringService::new(
        ClassifierAdapter::new(Arc::new(FixedClassifier::new(0.3))),
        Arc::new(FailingStore),
        DecisionPolicy::default(),
        PersistenceMode::BestEffort,
    );

    let outcome = service.score(&sample_raw()).await.unwrap();
    assert_eq!(outcome.record_id, None);
    assert_eq!(outcome.result.label, Label::NonFraudulent);
    assert_eq!(outcome.result.tier, RiskTier::Low);
}

#[tokio::test]
async fn test_not_idempotent() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = service(Arc::new(FixedClassifier::new(0.6)), store.clone());

    let first = service.score(&sample_raw()).await.unwrap();
    let second = service.score(&sample_raw()).await.unwrap();

    assert_eq!(store.len(), 2);
    assert_ne!(first.record_id, second.record_id);
    assert_eq!(first.result, second.result);
}

#[tokio::test]
async fn test_custom_threshold() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = ScoringService::new(
        ClassifierAdapter::new(Arc::new(FixedClassifier::new(0.6))),
        store,
        DecisionPolicy::new(0.5).unwrap(),
        PersistenceMode::Strict,
    );

    let outcome = service.score(&sample_raw()).await.unwrap();
    assert_eq!(outcome.result.label, Label::Fraudulent);
    assert_eq!(outcome.result.tier, RiskTier::High);
}

#[tokio::test]
async fn test_concurrent_requests() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = service(Arc::new(FixedClassifier::new(0.42)), store.clone());

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.score(&sample_raw()).await.unwrap().record_id.unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
    assert_eq!(store.len(), 20);
}

#[test]
fn test_rounding_ties_to_even() {
    let policy = DecisionPolicy::default();
    let rounded = |p: f64| ScoringResult::new(p, policy.decide(p)).rounded_probability();

    assert_eq!(rounded(0.125), 0.12);
    assert_eq!(rounded(0.625), 0.62);
    assert_eq!(rounded(0.875), 0.88);
    assert_eq!(rounded(0.654), 0.65);
    assert_eq!(rounded(0.92), 0.92);
}

#[tokio::test]
async fn test_stored_probability_uses_same_rounding() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = service(Arc::new(FixedClassifier::new(0.625)), store.clone());

    let outcome = service.score(&sample_raw()).await.unwrap();
    assert_eq!(outcome.result.rounded_probability(), 0.62);
    assert_eq!(store.records()[0].probability, 0.62);
}
