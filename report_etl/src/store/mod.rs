//! Idempotent record store and per-file processing ledger.
//!
//! [`IngestionRepo`] is the surface the pipeline needs; the SQLite
//! implementation, [`IngestionStore`], lives in `sqlite.rs`.
//!
//! Records are merged under their natural keys (last write wins), one row per
//! statement, so a failing row never rolls back rows already applied.

mod sqlite;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use report_parsers::{DeliveryRecord, DocumentKind, InventoryRecord, Product, ReportType};
use serde::Serialize;
use thiserror::Error;

pub use sqlite::{IngestionStore, StoreOptions};

/// Errors raised by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened, initialized or locked for writing.
    /// Fatal for the whole run.
    #[error("store unavailable at {path}: {reason}")]
    Unavailable {
        /// Database file.
        path: PathBuf,
        /// What failed.
        reason: String,
    },

    /// A query failed.
    #[error("query failed")]
    Query(#[from] diesel::result::Error),

    /// A stored value could not be mapped back to the model.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Result type used by the store.
pub type StoreResult<T> = Result<T, StoreError>;

/// One record that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// Position of the record in the batch.
    pub index: usize,
    /// Natural key, rendered for logs.
    pub key: String,
    /// Why the write failed.
    pub error: String,
}

/// Outcome of a batch upsert. Rows are applied independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    /// Rows inserted or updated.
    pub applied: usize,
    /// Rows that failed.
    pub failures: Vec<RowFailure>,
}

impl UpsertReport {
    /// `true` when the batch was non-empty and no row was applied.
    pub fn all_failed(&self) -> bool {
        self.applied == 0 && !self.failures.is_empty()
    }
}

/// Terminal status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LedgerStatus {
    /// Parsed and persisted (possibly with some row failures).
    Success,
    /// Classification, parsing or persistence failed.
    Failed,
    /// Recognized but intentionally not parsed.
    Skipped,
}

impl LedgerStatus {
    /// Stored value.
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerStatus::Success => "success",
            LedgerStatus::Failed => "failed",
            LedgerStatus::Skipped => "skipped",
        }
    }

    /// `success` and `skipped` entries are not revisited unless reprocessing
    /// is forced.
    pub fn is_terminal(self) -> bool {
        matches!(self, LedgerStatus::Success | LedgerStatus::Skipped)
    }
}

impl FromStr for LedgerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(LedgerStatus::Success),
            "failed" => Ok(LedgerStatus::Failed),
            "skipped" => Ok(LedgerStatus::Skipped),
            other => Err(format!("unknown ledger status: {other}")),
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger row: the outcome of processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Absolute path; the ledger key.
    pub file_path: String,
    /// File name component.
    pub file_name: String,
    /// Which parser the file was routed to.
    pub file_kind: DocumentKind,
    /// Size in bytes.
    pub file_size: u64,
    /// When processing finished.
    pub processed_at: DateTime<Utc>,
    /// Outcome.
    pub status: LedgerStatus,
    /// Records written.
    pub records_inserted: u64,
    /// Failure description, or a partial-failure note on success.
    pub error_message: Option<String>,
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Ledger entries per status, in status order.
    pub files_by_status: IndexMap<String, i64>,
    /// All ledger entries.
    pub total_files: i64,
    /// Rows in `inventory_history`.
    pub inventory_rows: i64,
    /// Rows in `delivery_notices`.
    pub delivery_rows: i64,
    /// Most recent ledger write.
    pub last_processed_at: Option<DateTime<Utc>>,
}

/// Read filter for [`IngestionRepo::inventory_history`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    /// Exact product.
    pub product: Option<Product>,
    /// Inclusive lower bound on activity date.
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound on activity date.
    pub end: Option<NaiveDate>,
}

/// Read filter for [`IngestionRepo::delivery_notices`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryFilter {
    /// Case-insensitive substring of the product name ("gold" matches "Micro Gold").
    pub product_contains: Option<String>,
    /// Exact report type.
    pub report_type: Option<ReportType>,
}

/// Storage surface used by the pipeline.
pub trait IngestionRepo {
    /// Merges inventory records under (activity_date, product, depository).
    fn upsert_inventory(&mut self, records: &[InventoryRecord]) -> UpsertReport;

    /// Merges delivery records under (intent_date, product, contract_month, report_type).
    fn upsert_delivery(&mut self, records: &[DeliveryRecord]) -> UpsertReport;

    /// `true` iff the ledger holds a success or skipped entry for `file_path`.
    fn is_processed(&mut self, file_path: &str) -> StoreResult<bool>;

    /// Inserts or replaces the ledger entry keyed on its file path.
    fn record_outcome(&mut self, entry: &LedgerEntry) -> StoreResult<()>;

    /// The ledger entry for `file_path`, if any.
    fn ledger_entry(&mut self, file_path: &str) -> StoreResult<Option<LedgerEntry>>;

    /// Aggregate counts. Read-only.
    fn stats(&mut self) -> StoreResult<StoreStats>;

    /// Inventory rows, newest activity date first.
    fn inventory_history(&mut self, filter: &InventoryFilter) -> StoreResult<Vec<InventoryRecord>>;

    /// Delivery rows, newest intent date first.
    fn delivery_notices(&mut self, filter: &DeliveryFilter) -> StoreResult<Vec<DeliveryRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip_and_terminality() {
        for s in [LedgerStatus::Success, LedgerStatus::Failed, LedgerStatus::Skipped] {
            assert_eq!(s.as_str().parse::<LedgerStatus>().unwrap(), s);
        }
        assert!(LedgerStatus::Success.is_terminal());
        assert!(LedgerStatus::Skipped.is_terminal());
        assert!(!LedgerStatus::Failed.is_terminal());
        assert!("SUCCESS".parse::<LedgerStatus>().is_err());
    }

    #[test]
    fn all_failed_needs_failures() {
        assert!(!UpsertReport::default().all_failed());
        let report = UpsertReport {
            applied: 0,
            failures: vec![RowFailure {
                index: 0,
                key: "k".into(),
                error: "e".into(),
            }],
        };
        assert!(report.all_failed());
    }
}
