//! ONNX Runtime classifier
//!
//! Expects a model taking one `[1, ENCODED_WIDTH]` f32 input (numeric columns
//! in layout order followed by the one-hot category block) and producing a
//! probability tensor, either `[p_negative, p_positive]` or `[p_positive]`.

use std::path::Path;

use chrono::Utc;
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use crate::features::{TransactionFeatures, ENCODED_WIDTH};
use super::classifier::{Classifier, InferenceError, ModelInfo};
use super::ModelFormat;

pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    output_name: String,
    info: ModelInfo,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        tracing::info!(path = %path.display(), "Loading ONNX model");

        if !path.exists() {
            return Err(InferenceError::ModelNotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::InvalidArtifact(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::InvalidArtifact(format!("optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| InferenceError::InvalidArtifact(format!("load failed: {}", e)))?;

        // skl2onnx names it "probabilities"; fall back to the last output
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::InvalidArtifact("model has no outputs".to_string()))?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx")
            .to_string();

        tracing::info!(model = %name, output = %output_name, "ONNX model loaded");

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            info: ModelInfo {
                name,
                format: ModelFormat::Onnx,
                path: path.display().to_string(),
                loaded_at: Utc::now(),
            },
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, features: &TransactionFeatures) -> Result<[f64; 2], InferenceError> {
        let input = Array2::<f32>::from_shape_vec((1, ENCODED_WIDTH), features.encode().to_vec())
            .map_err(|e| InferenceError::Runtime(format!("array error: {}", e)))?;

        let input_tensor = Value::from_array(input)
            .map_err(|e| InferenceError::Runtime(format!("tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Runtime(format!("run failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| InferenceError::Runtime(format!("missing output {}", self.output_name)))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Runtime(format!("extract error: {}", e)))?;

        let positive = match data {
            [_, positive] => f64::from(*positive),
            [positive] => f64::from(*positive),
            other => {
                return Err(InferenceError::Runtime(format!(
                    "expected 1 or 2 probabilities, got {}",
                    other.len()
                )))
            }
        };

        Ok([1.0 - positive, positive])
    }

    fn info(&self) -> ModelInfo {
        self.info.clone()
    }
}
