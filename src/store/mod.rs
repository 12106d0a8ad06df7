//! Transaction Record Store
//!
//! Append-only persistence of scored transactions. Every backend assigns a
//! unique, increasing id and a creation timestamp, and only returns once the
//! full record is durable.

pub mod csv_file;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::Label;
use crate::features::TransactionFeatures;

pub use csv_file::CsvTransactionStore;
pub use memory::InMemoryTransactionStore;
pub use postgres::PgTransactionStore;

/// What the pipeline hands to the store
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTransaction {
    pub features: TransactionFeatures,
    pub prediction: Label,
    /// Already rounded to two decimals
    pub probability: f64,
}

/// Store-assigned identity of a persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RecordReceipt {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// A persisted scored transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub features: TransactionFeatures,
    pub prediction: Label,
    pub probability: f64,
}

impl TransactionRecord {
    pub fn new(receipt: RecordReceipt, scored: ScoredTransaction) -> Self {
        Self {
            id: receipt.id,
            created_at: receipt.created_at,
            features: scored.features,
            prediction: scored.prediction,
            probability: scored.probability,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Durably record one scored transaction. All-or-nothing.
    async fn append(&self, record: ScoredTransaction) -> Result<RecordReceipt, StoreError>;

    fn backend_name(&self) -> &'static str;
}
