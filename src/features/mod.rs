//! Features Module - Request fields to model input
//!
//! Validation and coercion of raw request fields, and the canonical column
//! layout the classifier consumes.

pub mod category;
pub mod layout;
pub mod vector;

pub use category::Category;
pub use layout::{LayoutInfo, ENCODED_WIDTH, FEATURE_COUNT, FEATURE_LAYOUT, NUMERIC_FEATURE_COUNT};
pub use vector::{RawTransaction, RawValue, TransactionFeatures, ValidationError};
