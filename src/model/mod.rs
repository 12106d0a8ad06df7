//! Model Module - Classifier loading and inference
//!
//! The classifier is loaded once at startup and shared read-only.
//! Loaders are swappable behind the `Classifier` trait.

pub mod classifier;
pub mod linear;
#[cfg(feature = "onnx")]
pub mod onnx;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use classifier::{Classifier, ClassifierAdapter, InferenceError, ModelInfo};
pub use linear::LinearClassifier;
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

/// Artifact formats the service can load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Linear,
    Onnx,
}

impl ModelFormat {
    /// `.onnx` files load through ONNX Runtime, anything else as a linear JSON artifact
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => ModelFormat::Onnx,
            _ => ModelFormat::Linear,
        }
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "json" => Ok(ModelFormat::Linear),
            "onnx" => Ok(ModelFormat::Onnx),
            other => Err(format!("unknown model format {other:?}")),
        }
    }
}

/// Load the classifier artifact at `path`
pub fn load_classifier(path: &Path, format: ModelFormat) -> Result<Arc<dyn Classifier>, InferenceError> {
    match format {
        ModelFormat::Linear => Ok(Arc::new(LinearClassifier::load(path)?)),
        #[cfg(feature = "onnx")]
        ModelFormat::Onnx => Ok(Arc::new(OnnxClassifier::load(path)?)),
        #[cfg(not(feature = "onnx"))]
        ModelFormat::Onnx => Err(InferenceError::Unsupported("onnx")),
    }
}
