use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{RecordReceipt, ScoredTransaction, StoreError, TransactionRecord, TransactionStore};

/// Process-local store.
///
/// Keeps records in a `Vec` behind a mutex. Ids start at 1. Nothing survives
/// a restart, so this is for tests and throwaway runs.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    records: Mutex<Vec<TransactionRecord>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn append(&self, record: ScoredTransaction) -> Result<RecordReceipt, StoreError> {
        let mut records = self.records.lock();

        let id = records.last().map(|r| r.id + 1).unwrap_or(1);
        let receipt = RecordReceipt {
            id,
            created_at: Utc::now(),
        };
        records.push(TransactionRecord::new(receipt, record));

        Ok(receipt)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
