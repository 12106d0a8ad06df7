//! Logistic model loaded from a JSON artifact
//!
//! Artifact shape:
//!
//! ```json
//! {
//!   "name": "fraud-logit-v3",
//!   "columns": ["amt", "city_pop", "lat", "long", "merch_lat", "merch_long", "unix_time", "category"],
//!   "intercept": -6.1,
//!   "coefficients": [2.4, 0.05, 0.0, 0.0, 0.0, 0.0, -0.1],
//!   "means": [70.3, 88824.4, 38.5, -90.2, 38.5, -90.2, 1.35e9],
//!   "scales": [160.3, 301956.3, 5.1, 13.8, 5.1, 13.8, 1.28e7],
//!   "category_weights": { "shopping_net": 1.1, "grocery_pos": 0.9 }
//! }
//! ```
//!
//! Numeric columns are standardised with `means`/`scales` when present.
//! Categories missing from `category_weights` contribute 0.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;

use crate::features::{layout, Category, TransactionFeatures, FEATURE_LAYOUT, NUMERIC_FEATURE_COUNT};
use super::classifier::{Classifier, InferenceError, ModelInfo};
use super::ModelFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct LinearArtifact {
    #[serde(default = "default_name")]
    pub name: String,
    pub columns: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub means: Option<Vec<f64>>,
    #[serde(default)]
    pub scales: Option<Vec<f64>>,
    #[serde(default)]
    pub category_weights: HashMap<String, f64>,
}

fn default_name() -> String {
    "linear".to_string()
}

#[derive(Debug)]
pub struct LinearClassifier {
    intercept: f64,
    coefficients: [f64; NUMERIC_FEATURE_COUNT],
    means: [f64; NUMERIC_FEATURE_COUNT],
    scales: [f64; NUMERIC_FEATURE_COUNT],
    category_weights: [f64; Category::COUNT],
    info: ModelInfo,
}

impl LinearClassifier {
    /// Load and validate an artifact from disk
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        tracing::info!(path = %path.display(), "Loading linear model");

        if !path.exists() {
            return Err(InferenceError::ModelNotFound(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::InvalidArtifact(format!("read failed: {}", e)))?;
        let artifact: LinearArtifact = serde_json::from_str(&text)
            .map_err(|e| InferenceError::InvalidArtifact(format!("parse failed: {}", e)))?;

        Self::from_artifact(artifact, &path.display().to_string())
    }

    pub fn from_artifact(artifact: LinearArtifact, origin: &str) -> Result<Self, InferenceError> {
        if !layout::matches_layout(&artifact.columns) {
            return Err(InferenceError::SchemaMismatch {
                expected: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
                found: artifact.columns,
            });
        }

        let coefficients = fixed_width("coefficients", &artifact.coefficients)?;
        let means = match &artifact.means {
            Some(values) => fixed_width("means", values)?,
            None => [0.0; NUMERIC_FEATURE_COUNT],
        };
        let scales = match &artifact.scales {
            Some(values) => fixed_width("scales", values)?,
            None => [1.0; NUMERIC_FEATURE_COUNT],
        };
        if scales.iter().any(|s| *s == 0.0) {
            return Err(InferenceError::InvalidArtifact("scales must be non-zero".to_string()));
        }
        if !artifact.intercept.is_finite() {
            return Err(InferenceError::InvalidArtifact("intercept must be finite".to_string()));
        }

        let mut category_weights = [0.0; Category::COUNT];
        for (label, weight) in &artifact.category_weights {
            let category: Category = label.parse().map_err(|_| {
                InferenceError::InvalidArtifact(format!("weight for unknown category {label:?}"))
            })?;
            if !weight.is_finite() {
                return Err(InferenceError::InvalidArtifact(format!(
                    "weight for {label} is not finite"
                )));
            }
            category_weights[category.index()] = *weight;
        }

        let info = ModelInfo {
            name: artifact.name,
            format: ModelFormat::Linear,
            path: origin.to_string(),
            loaded_at: Utc::now(),
        };

        tracing::info!(model = %info.name, "Linear model ready");

        Ok(Self {
            intercept: artifact.intercept,
            coefficients,
            means,
            scales,
            category_weights,
            info,
        })
    }

    fn logit(&self, features: &TransactionFeatures) -> f64 {
        let numeric: f64 = features
            .numeric_values()
            .iter()
            .enumerate()
            .map(|(i, x)| self.coefficients[i] * (x - self.means[i]) / self.scales[i])
            .sum();

        self.intercept + numeric + self.category_weights[features.category.index()]
    }
}

impl Classifier for LinearClassifier {
    fn predict_proba(&self, features: &TransactionFeatures) -> Result<[f64; 2], InferenceError> {
        let z = self.logit(features);
        if z.is_nan() {
            return Err(InferenceError::Runtime("logit is NaN".to_string()));
        }

        let positive = sigmoid(z);
        Ok([1.0 - positive, positive])
    }

    fn info(&self) -> ModelInfo {
        self.info.clone()
    }
}

fn fixed_width(name: &str, values: &[f64]) -> Result<[f64; NUMERIC_FEATURE_COUNT], InferenceError> {
    let array: [f64; NUMERIC_FEATURE_COUNT] = values.try_into().map_err(|_| {
        InferenceError::InvalidArtifact(format!(
            "{} has {} entries, expected {}",
            name,
            values.len(),
            NUMERIC_FEATURE_COUNT
        ))
    })?;

    if array.iter().any(|v| !v.is_finite()) {
        return Err(InferenceError::InvalidArtifact(format!("{name} contains non-finite values")));
    }

    Ok(array)
}

/// Logistic function, stable for large |z|
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_features;
    use std::io::Write;

    fn artifact() -> LinearArtifact {
        LinearArtifact {
            name: "test-logit".to_string(),
            columns: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            intercept: -2.0,
            coefficients: vec![0.01, 0.0, 0.5, -0.2, 0.0, 0.0, 0.0],
            means: None,
            scales: None,
            category_weights: HashMap::from([("shopping_net".to_string(), 1.5)]),
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = LinearClassifier::from_artifact(artifact(), "memory").unwrap();
        let [negative, positive] = model.predict_proba(&sample_features()).unwrap();
        assert!((negative + positive - 1.0).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&positive));
    }

    #[test]
    fn test_known_logit() {
        let model = LinearClassifier::from_artifact(artifact(), "memory").unwrap();
        let features = sample_features();
        // -2 + 0.01*250 + 0.5*40.71 - 0.2*(-74) + 1.5
        let z = -2.0 + 2.5 + 20.355 + 14.8 + 1.5;
        let [_, positive] = model.predict_proba(&features).unwrap();
        assert!((positive - sigmoid(z)).abs() < 1e-12);
    }

    #[test]
    fn test_column_order_matters() {
        let model = LinearClassifier::from_artifact(artifact(), "memory").unwrap();
        let features = sample_features();
        let mut swapped = features.clone();
        std::mem::swap(&mut swapped.latitude, &mut swapped.longitude);

        let [_, a] = model.predict_proba(&features).unwrap();
        let [_, b] = model.predict_proba(&swapped).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_extreme_logit_stays_in_range() {
        let mut extreme = artifact();
        extreme.coefficients = vec![1e6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let model = LinearClassifier::from_artifact(extreme, "memory").unwrap();
        let [_, positive] = model.predict_proba(&sample_features()).unwrap();
        assert_eq!(positive, 1.0);

        let mut extreme = artifact();
        extreme.coefficients = vec![-1e6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let model = LinearClassifier::from_artifact(extreme, "memory").unwrap();
        let [_, positive] = model.predict_proba(&sample_features()).unwrap();
        assert!(positive >= 0.0 && positive < 1e-100);
    }

    #[test]
    fn test_schema_mismatch() {
        let mut bad = artifact();
        bad.columns.swap(0, 1);
        let err = LinearClassifier::from_artifact(bad, "memory").unwrap_err();
        assert!(matches!(err, InferenceError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_wrong_coefficient_count() {
        let mut bad = artifact();
        bad.coefficients.pop();
        let err = LinearClassifier::from_artifact(bad, "memory").unwrap_err();
        assert!(matches!(err, InferenceError::InvalidArtifact(_)));
    }

    #[test]
    fn test_unknown_category_weight() {
        let mut bad = artifact();
        bad.category_weights.insert("crypto_net".to_string(), 3.0);
        let err = LinearClassifier::from_artifact(bad, "memory").unwrap_err();
        assert!(matches!(err, InferenceError::InvalidArtifact(_)));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut bad = artifact();
        bad.scales = Some(vec![1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        assert!(LinearClassifier::from_artifact(bad, "memory").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "file-logit",
                "columns": ["amt", "city_pop", "lat", "long", "merch_lat", "merch_long", "unix_time", "category"],
                "intercept": 0.0,
                "coefficients": [0, 0, 0, 0, 0, 0, 0]
            }}"#
        )
        .unwrap();

        let model = LinearClassifier::load(file.path()).unwrap();
        assert_eq!(model.info().name, "file-logit");
        let [_, positive] = model.predict_proba(&sample_features()).unwrap();
        assert_eq!(positive, 0.5);
    }

    #[test]
    fn test_load_missing_file() {
        let err = LinearClassifier::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, InferenceError::ModelNotFound(_)));
    }
}
