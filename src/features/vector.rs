//! Transaction feature record and its builder
//!
//! Turns loosely-typed request fields into a validated `TransactionFeatures`
//! and projects it onto the canonical column order from `layout.rs`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::layout::{ENCODED_WIDTH, NUMERIC_FEATURE_COUNT};

// ============================================================================
// RAW INPUT
// ============================================================================

/// One request field before coercion
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    /// Any other JSON shape (bool, null, array, object); carries the kind for messages
    Other(&'static str),
}

impl RawValue {
    fn describe(&self) -> String {
        match self {
            RawValue::Text(s) => format!("{s:?}"),
            RawValue::Number(n) => n.to_string(),
            RawValue::Other(kind) => kind.to_string(),
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::String(s) => RawValue::Text(s),
            Value::Number(n) => n
                .as_f64()
                .map(RawValue::Number)
                .unwrap_or(RawValue::Other("number")),
            Value::Bool(_) => RawValue::Other("boolean"),
            Value::Null => RawValue::Other("null"),
            Value::Array(_) => RawValue::Other("array"),
            Value::Object(_) => RawValue::Other("object"),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// Request fields keyed by wire name; unknown keys are ignored
pub type RawTransaction = HashMap<String, RawValue>;

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' must be a finite number, got {value}")]
    TypeMismatch { field: &'static str, value: String },

    #[error("unknown category {value:?}")]
    UnknownCategory { value: String },

    #[error("field '{field}' must not be negative, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

// ============================================================================
// TRANSACTION FEATURES
// ============================================================================

/// One transaction's validated inputs. Serialized with the wire/column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionFeatures {
    #[serde(rename = "amt")]
    pub amount: f64,
    #[serde(rename = "city_pop")]
    pub city_population: f64,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "long")]
    pub longitude: f64,
    #[serde(rename = "merch_lat")]
    pub merchant_latitude: f64,
    #[serde(rename = "merch_long")]
    pub merchant_longitude: f64,
    #[serde(rename = "unix_time")]
    pub unix_timestamp: f64,
    pub category: Category,
}

impl TransactionFeatures {
    /// Validate and coerce raw request fields
    pub fn build(raw: &RawTransaction) -> Result<Self, ValidationError> {
        let amount = non_negative("amt", numeric(raw, "amt")?)?;
        let city_population = non_negative("city_pop", numeric(raw, "city_pop")?)?;
        let latitude = numeric(raw, "lat")?;
        let longitude = numeric(raw, "long")?;
        let merchant_latitude = numeric(raw, "merch_lat")?;
        let merchant_longitude = numeric(raw, "merch_long")?;
        let unix_timestamp = numeric(raw, "unix_time")?;
        let category = category(raw)?;

        Ok(Self {
            amount,
            city_population,
            latitude,
            longitude,
            merchant_latitude,
            merchant_longitude,
            unix_timestamp,
            category,
        })
    }

    /// Numeric columns in canonical order
    pub fn numeric_values(&self) -> [f64; NUMERIC_FEATURE_COUNT] {
        [
            self.amount,
            self.city_population,
            self.latitude,
            self.longitude,
            self.merchant_latitude,
            self.merchant_longitude,
            self.unix_timestamp,
        ]
    }

    /// Dense f32 encoding: numeric columns, then one-hot category
    pub fn encode(&self) -> [f32; ENCODED_WIDTH] {
        let mut encoded = [0.0f32; ENCODED_WIDTH];

        for (slot, value) in encoded.iter_mut().zip(self.numeric_values()) {
            *slot = value as f32;
        }
        encoded[NUMERIC_FEATURE_COUNT + self.category.index()] = 1.0;

        encoded
    }
}

fn field<'a>(raw: &'a RawTransaction, name: &'static str) -> Result<&'a RawValue, ValidationError> {
    raw.get(name)
        .ok_or(ValidationError::MissingField { field: name })
}

fn numeric(raw: &RawTransaction, name: &'static str) -> Result<f64, ValidationError> {
    let value = field(raw, name)?;

    let parsed = match value {
        RawValue::Number(n) => Some(*n),
        // Surrounding whitespace is tolerated, nothing else
        RawValue::Text(s) => s.trim().parse::<f64>().ok(),
        RawValue::Other(_) => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::TypeMismatch {
            field: name,
            value: value.describe(),
        }),
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value < 0.0 {
        return Err(ValidationError::OutOfRange { field: name, value });
    }
    Ok(value)
}

fn category(raw: &RawTransaction) -> Result<Category, ValidationError> {
    match field(raw, "category")? {
        RawValue::Text(label) => label
            .parse()
            .map_err(|_| ValidationError::UnknownCategory { value: label.clone() }),
        other => Err(ValidationError::UnknownCategory { value: other.describe() }),
    }
}

// ============================================================================
// TESTS
// ============================================================================
