use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use diesel::dsl::{count_star, max};
use diesel::prelude::*;
use report_parsers::{DeliveryRecord, DocumentKind, InventoryRecord};
use tracing::{debug, info, warn};

use super::{
    DeliveryFilter, IngestionRepo, InventoryFilter, LedgerEntry, LedgerStatus, RowFailure,
    StoreError, StoreResult, StoreStats, UpsertReport,
};
use crate::db::connection::{ConnectOptions, DEFAULT_BUSY_TIMEOUT_MS, connect_sqlite_with};
use crate::db::migrate;
use crate::models::{DeliveryNoticeRow, InventoryHistoryRow, LedgerRow, NewDeliveryRow, NewInventoryRow};
use crate::schema::delivery_notices::dsl as dn;
use crate::schema::file_processing_log::dsl as lg;
use crate::schema::inventory_history::dsl as ih;
use crate::schema::store_meta::dsl as meta;

/// Settings for [`IngestionStore::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long a second opener waits on the writer lock before giving up.
    pub busy_timeout_ms: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// SQLite-backed [`IngestionRepo`].
///
/// Opening the store applies the embedded migration and takes an exclusive
/// lock on the database file that is held until the store is dropped, so only
/// one process can ingest into a given file at a time.
pub struct IngestionStore {
    conn: SqliteConnection,
    path: PathBuf,
}

impl std::fmt::Debug for IngestionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl IngestionStore {
    /// Opens (creating if needed) the database at `path` and claims the
    /// writer lock. Every failure here is [`StoreError::Unavailable`].
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |reason: String| StoreError::Unavailable {
            path: path.clone(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| unavailable(e.to_string()))?;
        }
        let url = path
            .to_str()
            .ok_or_else(|| unavailable("path is not valid UTF-8".into()))?;

        let mut conn = connect_sqlite_with(
            url,
            ConnectOptions {
                busy_timeout_ms: options.busy_timeout_ms,
                exclusive: true,
            },
        )
        .map_err(|e| unavailable(format!("{e:#}")))?;
        migrate::run_pending(&mut conn).map_err(|e| unavailable(format!("{e:#}")))?;

        // A write takes the exclusive lock; locking_mode=EXCLUSIVE keeps it.
        let opened_at = Utc::now().to_rfc3339();
        diesel::insert_into(meta::store_meta)
            .values((meta::key.eq("last_opened_at"), meta::value.eq(&opened_at)))
            .on_conflict(meta::key)
            .do_update()
            .set(meta::value.eq(&opened_at))
            .execute(&mut conn)
            .map_err(|e| unavailable(format!("could not take the writer lock: {e}")))?;

        info!(path = %path.display(), "opened ingestion store");
        Ok(Self { conn, path })
    }

    /// Database file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying connection, for ad-hoc queries.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

fn entry_from_row(row: LedgerRow) -> StoreResult<LedgerEntry> {
    Ok(LedgerEntry {
        file_kind: row
            .file_kind
            .parse::<DocumentKind>()
            .map_err(StoreError::Corrupt)?,
        status: row.status.parse::<LedgerStatus>().map_err(StoreError::Corrupt)?,
        file_size: u64::try_from(row.file_size).unwrap_or_default(),
        records_inserted: u64::try_from(row.records_inserted).unwrap_or_default(),
        processed_at: row.processed_at.and_utc(),
        file_path: row.file_path,
        file_name: row.file_name,
        error_message: row.error_message,
    })
}

fn failure(index: usize, key: String, error: impl ToString) -> RowFailure {
    let error = error.to_string();
    warn!(index, %key, %error, "row not persisted");
    RowFailure { index, key, error }
}

impl IngestionRepo for IngestionStore {
    fn upsert_inventory(&mut self, records: &[InventoryRecord]) -> UpsertReport {
        let now = Utc::now().naive_utc();
        let mut report = UpsertReport::default();
        for (index, record) in records.iter().enumerate() {
            let row = NewInventoryRow::from_record(record, now);
            let result = diesel::insert_into(ih::inventory_history)
                .values(&row)
                .on_conflict((ih::activity_date, ih::product, ih::depository))
                .do_update()
                .set(&row)
                .execute(&mut self.conn);
            match result {
                Ok(_) => report.applied += 1,
                Err(e) => report.failures.push(failure(
                    index,
                    format!("{} {} {}", record.activity_date, record.product, record.depository),
                    e,
                )),
            }
        }
        debug!(applied = report.applied, failed = report.failures.len(), "inventory upsert");
        report
    }

    fn upsert_delivery(&mut self, records: &[DeliveryRecord]) -> UpsertReport {
        let now = Utc::now().naive_utc();
        let mut report = UpsertReport::default();
        for (index, record) in records.iter().enumerate() {
            let key = || {
                format!(
                    "{} {} {} {}",
                    record.intent_date, record.product, record.contract_month, record.report_type
                )
            };
            let row = match NewDeliveryRow::from_record(record, now) {
                Ok(row) => row,
                Err(e) => {
                    report.failures.push(failure(index, key(), e));
                    continue;
                }
            };
            let result = diesel::insert_into(dn::delivery_notices)
                .values(&row)
                .on_conflict((dn::intent_date, dn::product, dn::contract_month, dn::report_type))
                .do_update()
                .set(&row)
                .execute(&mut self.conn);
            match result {
                Ok(_) => report.applied += 1,
                Err(e) => report.failures.push(failure(index, key(), e)),
            }
        }
        debug!(applied = report.applied, failed = report.failures.len(), "delivery upsert");
        report
    }

    fn is_processed(&mut self, file_path: &str) -> StoreResult<bool> {
        let status: Option<String> = lg::file_processing_log
            .filter(lg::file_path.eq(file_path))
            .select(lg::status)
            .first(&mut self.conn)
            .optional()?;
        Ok(status
            .and_then(|s| s.parse::<LedgerStatus>().ok())
            .is_some_and(LedgerStatus::is_terminal))
    }

    fn record_outcome(&mut self, entry: &LedgerEntry) -> StoreResult<()> {
        let row = LedgerRow {
            file_path: entry.file_path.clone(),
            file_name: entry.file_name.clone(),
            file_kind: entry.file_kind.as_str().to_string(),
            file_size: i64::try_from(entry.file_size).unwrap_or(i64::MAX),
            processed_at: entry.processed_at.naive_utc(),
            status: entry.status.as_str().to_string(),
            records_inserted: i64::try_from(entry.records_inserted).unwrap_or(i64::MAX),
            error_message: entry.error_message.clone(),
        };
        diesel::insert_into(lg::file_processing_log)
            .values(&row)
            .on_conflict(lg::file_path)
            .do_update()
            .set(&row)
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn ledger_entry(&mut self, file_path: &str) -> StoreResult<Option<LedgerEntry>> {
        lg::file_processing_log
            .filter(lg::file_path.eq(file_path))
            .select(LedgerRow::as_select())
            .first(&mut self.conn)
            .optional()?
            .map(entry_from_row)
            .transpose()
    }

    fn stats(&mut self) -> StoreResult<StoreStats> {
        let mut stats = StoreStats::default();
        for status in [LedgerStatus::Success, LedgerStatus::Failed, LedgerStatus::Skipped] {
            stats.files_by_status.insert(status.as_str().to_string(), 0);
        }
        let grouped: Vec<(String, i64)> = lg::file_processing_log
            .group_by(lg::status)
            .select((lg::status, count_star()))
            .load(&mut self.conn)?;
        for (status, count) in grouped {
            stats.total_files += count;
            stats.files_by_status.insert(status, count);
        }
        stats.inventory_rows = ih::inventory_history
            .select(count_star())
            .first(&mut self.conn)?;
        stats.delivery_rows = dn::delivery_notices
            .select(count_star())
            .first(&mut self.conn)?;
        let last: Option<NaiveDateTime> = lg::file_processing_log
            .select(max(lg::processed_at))
            .first(&mut self.conn)?;
        stats.last_processed_at = last.map(|t| t.and_utc());
        Ok(stats)
    }

    fn inventory_history(&mut self, filter: &InventoryFilter) -> StoreResult<Vec<InventoryRecord>> {
        let mut query = ih::inventory_history.into_boxed();
        if let Some(product) = &filter.product {
            query = query.filter(ih::product.eq(product.as_str().to_string()));
        }
        if let Some(start) = filter.start {
            query = query.filter(ih::activity_date.ge(start));
        }
        if let Some(end) = filter.end {
            query = query.filter(ih::activity_date.le(end));
        }
        let rows: Vec<InventoryHistoryRow> = query
            .order((ih::activity_date.desc(), ih::product.asc(), ih::depository.asc()))
            .select(InventoryHistoryRow::as_select())
            .load(&mut self.conn)?;
        Ok(rows.into_iter().map(InventoryRecord::from).collect())
    }

    fn delivery_notices(&mut self, filter: &DeliveryFilter) -> StoreResult<Vec<DeliveryRecord>> {
        let mut query = dn::delivery_notices.into_boxed();
        if let Some(fragment) = &filter.product_contains {
            // LIKE is case-insensitive for ASCII in SQLite
            query = query.filter(dn::product.like(contains_pattern(fragment)).escape('\\'));
        }
        if let Some(report_type) = filter.report_type {
            query = query.filter(dn::report_type.eq(report_type.as_str()));
        }
        let rows: Vec<DeliveryNoticeRow> = query
            .order((dn::intent_date.desc(), dn::product.asc(), dn::contract_month.asc()))
            .select(DeliveryNoticeRow::as_select())
            .load(&mut self.conn)?;
        rows.into_iter()
            .map(|row| DeliveryRecord::try_from(row).map_err(StoreError::Corrupt))
            .collect()
    }
}

/// `LIKE` pattern matching `fragment` literally anywhere in the value.
fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
