//! PostgreSQL-backed record store

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RecordReceipt, ScoredTransaction, StoreError, TransactionStore};

/// Single-statement insert: the row is either fully committed or absent.
/// `id` comes from a BIGSERIAL, `created_at` from the column default.
const INSERT_SQL: &str = r#"
INSERT INTO transactions (amt, city_pop, lat, long, merch_lat, merch_long, unix_time, category, prediction, probability)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
RETURNING id, created_at
"#;

#[derive(Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn append(&self, record: ScoredTransaction) -> Result<RecordReceipt, StoreError> {
        let f = &record.features;

        let receipt = sqlx::query_as::<_, RecordReceipt>(INSERT_SQL)
            .bind(f.amount)
            .bind(f.city_population)
            .bind(f.latitude)
            .bind(f.longitude)
            .bind(f.merchant_latitude)
            .bind(f.merchant_longitude)
            .bind(f.unix_timestamp)
            .bind(f.category.as_str())
            .bind(record.prediction.as_str())
            .bind(record.probability)
            .fetch_one(&self.pool)
            .await?;

        Ok(receipt)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
