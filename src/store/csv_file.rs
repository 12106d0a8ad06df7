//! Append-only CSV record file
//!
//! One header line, then one row per scored transaction. Ids continue from
//! the largest id already in the file. Each row is serialized in full before
//! a single write, then synced; a failed write is truncated away so the file
//! never ends in a partial row.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::decision::Label;
use crate::features::Category;
use super::{RecordReceipt, ScoredTransaction, StoreError, TransactionStore};

/// Flat row layout; the csv crate cannot serialize flattened structs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub amt: f64,
    pub city_pop: f64,
    pub lat: f64,
    pub long: f64,
    pub merch_lat: f64,
    pub merch_long: f64,
    pub unix_time: f64,
    pub category: Category,
    pub prediction: Label,
    pub probability: f64,
}

impl CsvRow {
    fn new(receipt: RecordReceipt, record: &ScoredTransaction) -> Self {
        let f = &record.features;
        Self {
            id: receipt.id,
            created_at: receipt.created_at,
            amt: f.amount,
            city_pop: f.city_population,
            lat: f.latitude,
            long: f.longitude,
            merch_lat: f.merchant_latitude,
            merch_long: f.merchant_longitude,
            unix_time: f.unix_timestamp,
            category: f.category,
            prediction: record.prediction,
            probability: record.probability,
        }
    }
}

struct CsvState {
    file: File,
    last_id: i64,
    header_written: bool,
}

pub struct CsvTransactionStore {
    path: PathBuf,
    state: Arc<Mutex<CsvState>>,
}

impl CsvTransactionStore {
    /// Open (or create) the record file and recover the id sequence
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        let header_written = file.metadata()?.len() > 0;
        if header_written {
            terminate_last_line(&mut file)?;
        }
        let last_id = if header_written { scan_last_id(&path)? } else { 0 };

        tracing::info!(path = %path.display(), last_id, "Record file opened");

        Ok(Self {
            path,
            state: Arc::new(Mutex::new(CsvState {
                file,
                last_id,
                header_written,
            })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Appends never start mid-line, even after a file was edited by hand
fn terminate_last_line(file: &mut File) -> io::Result<()> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;

    if last[0] != b'\n' {
        tracing::warn!("Record file lacks a final newline, repairing");
        write_durably(file, b"\n")?;
    }
    Ok(())
}

fn scan_last_id(path: &Path) -> Result<i64, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut last_id = 0;

    for row in reader.deserialize::<CsvRow>() {
        last_id = last_id.max(row?.id);
    }

    Ok(last_id)
}

fn append_row(state: &Mutex<CsvState>, record: &ScoredTransaction) -> Result<RecordReceipt, StoreError> {
    append_row_with(state, record, write_durably)
}

fn append_row_with<W>(
    state: &Mutex<CsvState>,
    record: &ScoredTransaction,
    write: W,
) -> Result<RecordReceipt, StoreError>
where
    W: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    let mut state = state.lock();

    let receipt = RecordReceipt {
        id: state.last_id + 1,
        created_at: Utc::now(),
    };

    let mut writer = WriterBuilder::new()
        .has_headers(!state.header_written)
        .from_writer(Vec::new());
    writer.serialize(CsvRow::new(receipt, record))?;
    let bytes = writer.into_inner().map_err(|e| StoreError::Io(e.into_error()))?;

    let start = state.file.metadata()?.len();
    if let Err(e) = write(&mut state.file, &bytes) {
        if let Err(truncate_err) = state.file.set_len(start) {
            tracing::error!(error = %truncate_err, "Failed to roll back partial record");
        }
        return Err(e.into());
    }

    state.last_id = receipt.id;
    state.header_written = true;

    Ok(receipt)
}

fn write_durably(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.sync_data()
}

#[async_trait]
impl TransactionStore for CsvTransactionStore {
    async fn append(&self, record: ScoredTransaction) -> Result<RecordReceipt, StoreError> {
        let state = self.state.clone();

        tokio::task::spawn_blocking(move || append_row(&state, &record))
            .await
            .map_err(|e| StoreError::Unavailable(format!("writer task failed: {}", e)))?
    }

    fn backend_name(&self) -> &'static str {
        "csv"
    }
}
