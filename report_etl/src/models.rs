//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables created by the embedded migration and
//! declared in [`crate::schema`]:
//! - [`crate::schema::inventory_history`]: one row per (activity date, product, depository)
//! - [`crate::schema::delivery_notices`]: one row per (intent date, product, contract, report type)
//! - [`crate::schema::file_processing_log`]: the per-file processing ledger
//!
//! Write-side structs borrow from parser records; read-side structs own their
//! data and convert back into the parser model types.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use report_parsers::{DeliveryRecord, InventoryRecord, Product, ReportType};

use crate::schema::*;

/// A row in [`crate::schema::inventory_history`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = inventory_history, check_for_backend(diesel::sqlite::Sqlite))]
pub struct InventoryHistoryRow {
    /// Business date of the snapshot.
    pub activity_date: NaiveDate,
    /// Product display name.
    pub product: String,
    /// Depository name as printed.
    pub depository: String,
    /// Registered quantity.
    pub registered: Option<f64>,
    /// Eligible quantity.
    pub eligible: Option<f64>,
    /// Total quantity.
    pub total: Option<f64>,
    /// Unit of measure.
    pub unit: String,
    /// Publication date, when printed.
    pub report_date: Option<NaiveDate>,
    /// Last time the row was written (UTC).
    pub updated_at: NaiveDateTime,
}

/// Insert / upsert form of an [`InventoryRecord`].
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(
    table_name = inventory_history,
    primary_key(activity_date, product, depository),
    treat_none_as_null = true
)]
pub struct NewInventoryRow<'a> {
    /// Key: business date.
    pub activity_date: NaiveDate,
    /// Key: product display name.
    pub product: &'a str,
    /// Key: depository.
    pub depository: &'a str,
    /// Registered quantity.
    pub registered: Option<f64>,
    /// Eligible quantity.
    pub eligible: Option<f64>,
    /// Total quantity.
    pub total: Option<f64>,
    /// Unit of measure.
    pub unit: &'a str,
    /// Publication date.
    pub report_date: Option<NaiveDate>,
    /// Write timestamp (UTC).
    pub updated_at: NaiveDateTime,
}

impl<'a> NewInventoryRow<'a> {
    /// Borrows a parser record for insertion.
    pub fn from_record(record: &'a InventoryRecord, now: NaiveDateTime) -> Self {
        Self {
            activity_date: record.activity_date,
            product: record.product.as_str(),
            depository: &record.depository,
            registered: record.registered,
            eligible: record.eligible,
            total: record.total,
            unit: &record.unit,
            report_date: record.report_date,
            updated_at: now,
        }
    }
}

impl From<InventoryHistoryRow> for InventoryRecord {
    fn from(row: InventoryHistoryRow) -> Self {
        InventoryRecord {
            activity_date: row.activity_date,
            product: stored_product(row.product),
            depository: row.depository,
            registered: row.registered,
            eligible: row.eligible,
            total: row.total,
            unit: row.unit,
            report_date: row.report_date,
        }
    }
}

/// A row in [`crate::schema::delivery_notices`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = delivery_notices, check_for_backend(diesel::sqlite::Sqlite))]
pub struct DeliveryNoticeRow {
    /// Intent date printed on the document.
    pub intent_date: NaiveDate,
    /// Product display name.
    pub product: String,
    /// Contract month label, e.g. "JANUARY 2026".
    pub contract_month: String,
    /// "Daily", "Monthly" or "YTD".
    pub report_type: String,
    /// Current period figure.
    pub daily_total: i64,
    /// Month-to-date figure.
    pub cumulative: i64,
    /// File the row was last written from.
    pub source_file: String,
    /// Last time the row was written (UTC).
    pub updated_at: NaiveDateTime,
}

/// Insert / upsert form of a [`DeliveryRecord`].
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(
    table_name = delivery_notices,
    primary_key(intent_date, product, contract_month, report_type)
)]
pub struct NewDeliveryRow<'a> {
    /// Key: intent date.
    pub intent_date: NaiveDate,
    /// Key: product display name.
    pub product: &'a str,
    /// Key: contract month.
    pub contract_month: &'a str,
    /// Key: report type.
    pub report_type: &'a str,
    /// Current period figure.
    pub daily_total: i64,
    /// Month-to-date figure.
    pub cumulative: i64,
    /// Provenance.
    pub source_file: &'a str,
    /// Write timestamp (UTC).
    pub updated_at: NaiveDateTime,
}

impl<'a> NewDeliveryRow<'a> {
    /// Borrows a parser record for insertion. Fails when a count does not fit
    /// the signed 64-bit column.
    pub fn from_record(
        record: &'a DeliveryRecord,
        now: NaiveDateTime,
    ) -> Result<Self, std::num::TryFromIntError> {
        Ok(Self {
            intent_date: record.intent_date,
            product: record.product.as_str(),
            contract_month: &record.contract_month,
            report_type: record.report_type.as_str(),
            daily_total: i64::try_from(record.daily_total)?,
            cumulative: i64::try_from(record.cumulative)?,
            source_file: &record.source_file,
            updated_at: now,
        })
    }
}

impl TryFrom<DeliveryNoticeRow> for DeliveryRecord {
    type Error = String;

    fn try_from(row: DeliveryNoticeRow) -> Result<Self, Self::Error> {
        Ok(DeliveryRecord {
            intent_date: row.intent_date,
            product: stored_product(row.product),
            contract_month: row.contract_month,
            daily_total: u64::try_from(row.daily_total).map_err(|e| e.to_string())?,
            cumulative: u64::try_from(row.cumulative).map_err(|e| e.to_string())?,
            report_type: row.report_type.parse::<ReportType>()?,
            source_file: row.source_file,
        })
    }
}

/// A row in [`crate::schema::file_processing_log`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(
    table_name = file_processing_log,
    primary_key(file_path),
    treat_none_as_null = true,
    check_for_backend(diesel::sqlite::Sqlite)
)]
pub struct LedgerRow {
    /// Absolute path of the source file.
    pub file_path: String,
    /// File name component.
    pub file_name: String,
    /// "inventory", "delivery" or "unknown".
    pub file_kind: String,
    /// Size in bytes at processing time.
    pub file_size: i64,
    /// Processing time (UTC).
    pub processed_at: NaiveDateTime,
    /// "success", "failed" or "skipped".
    pub status: String,
    /// Rows written to the record tables.
    pub records_inserted: i64,
    /// Failure description, if any.
    pub error_message: Option<String>,
}

fn stored_product(name: String) -> Product {
    name.parse::<Product>().unwrap_or(Product::Other(name))
}
