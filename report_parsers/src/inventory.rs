//! Inventory snapshot parsing (depository stocks spreadsheets).
//!
//! A snapshot is a sheet with a few metadata rows ("Activity Date", "Report
//! Date", unit of measure) above a table with one row per depository and
//! registered / eligible / total columns. The table's start row varies between
//! publications, so the header is located by probing.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::dates::find_date;
use crate::errors::{ParseError, ParseResult};
use crate::models::{InventoryRecord, Product};
use crate::numeric;
use crate::source::{Sheet, load_sheet};

/// Units recognized in metadata rows, matched case-insensitively.
const UNITS: [(&str, &str); 4] = [
    ("troy ounce", "Troy Ounces"),
    ("short ton", "Short Tons"),
    ("metric ton", "Metric Tons"),
    ("pound", "Pounds"),
];

/// Tunables for the metadata and header search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryParserOptions {
    /// Rows scanned for "Activity Date" / "Report Date" / unit.
    pub metadata_scan_rows: usize,
    /// Rows probed for the table header.
    pub header_search_rows: usize,
    /// Unit used when the sheet does not name one.
    pub default_unit: String,
}

impl Default for InventoryParserOptions {
    fn default() -> Self {
        Self {
            metadata_scan_rows: 15,
            header_search_rows: 25,
            default_unit: "Troy Ounces".to_string(),
        }
    }
}

/// Records extracted from one sheet plus row-level bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryParse {
    pub records: Vec<InventoryRecord>,
    /// Rows dropped because a quantity cell was not a number.
    pub dropped_rows: usize,
    /// Records whose total disagrees with registered + eligible.
    pub total_mismatches: usize,
}

#[derive(Debug, Default)]
struct Metadata {
    activity_date: Option<NaiveDate>,
    report_date: Option<NaiveDate>,
    unit: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    header_row: usize,
    depository: usize,
    registered: Option<usize>,
    eligible: Option<usize>,
    total: Option<usize>,
}

/// Stateless parser for inventory snapshots.
#[derive(Debug, Clone, Default)]
pub struct InventoryReportParser {
    options: InventoryParserOptions,
}

impl InventoryReportParser {
    pub fn new(options: InventoryParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InventoryParserOptions {
        &self.options
    }

    /// Loads `path` (CSV, XLS or XLSX) and parses its first sheet.
    pub fn parse_path(&self, path: &Path, product: &Product) -> ParseResult<InventoryParse> {
        let sheet = load_sheet(path)?;
        let parsed = self.parse_sheet(&sheet, product)?;
        info!(
            file = %path.display(),
            %product,
            records = parsed.records.len(),
            dropped = parsed.dropped_rows,
            "parsed inventory snapshot"
        );
        Ok(parsed)
    }

    /// Extracts one record per depository row.
    pub fn parse_sheet(&self, sheet: &Sheet, product: &Product) -> ParseResult<InventoryParse> {
        let meta = self.scan_metadata(sheet);
        let activity_date = match (meta.activity_date, meta.report_date) {
            (Some(d), _) => d,
            (None, Some(d)) => {
                warn!(date = %d, "no Activity Date, using Report Date");
                d
            }
            (None, None) => {
                return Err(ParseError::MetadataNotFound(
                    "Activity Date (or Report Date)".into(),
                ));
            }
        };
        let unit = meta
            .unit
            .map(str::to_string)
            .unwrap_or_else(|| self.options.default_unit.clone());

        let columns = self.find_header(sheet)?;
        debug!(?columns, "located inventory table header");

        let mut out = InventoryParse::default();
        for (offset, row) in sheet.rows.iter().enumerate().skip(columns.header_row + 1) {
            let depository = row
                .get(columns.depository)
                .map(|c| c.trim())
                .unwrap_or("");
            if depository.is_empty() || is_summary(depository) || is_header_label(depository) {
                continue;
            }

            let quantity = |col: Option<usize>| match col {
                Some(c) => numeric::parse_quantity(sheet.cell(offset, c)),
                None => Ok(None),
            };
            let (registered, eligible, total) = match (
                quantity(columns.registered),
                quantity(columns.eligible),
                quantity(columns.total),
            ) {
                (Ok(r), Ok(e), Ok(t)) => (r, e, t),
                (r, e, t) => {
                    let err = [r.err(), e.err(), t.err()].into_iter().flatten().next();
                    if let Some(err) = err {
                        warn!(row = offset + 1, %depository, error = %err, "dropping inventory row");
                    }
                    out.dropped_rows += 1;
                    continue;
                }
            };
            if registered.is_none() && eligible.is_none() && total.is_none() {
                // section captions and footnotes sit in the depository column
                debug!(row = offset + 1, text = %depository, "skipping row without quantities");
                continue;
            }

            let record = InventoryRecord {
                activity_date,
                product: product.clone(),
                depository: depository.to_string(),
                registered,
                eligible,
                total,
                unit: unit.clone(),
                report_date: meta.report_date,
            };
            if let Some(gap) = record.imbalance().filter(|_| !record.is_balanced()) {
                warn!(%depository, gap, "total does not equal registered + eligible");
                out.total_mismatches += 1;
            }
            out.records.push(record);
        }

        if out.records.is_empty() {
            return Err(ParseError::NoRecords);
        }
        Ok(out)
    }

    fn scan_metadata(&self, sheet: &Sheet) -> Metadata {
        let mut meta = Metadata::default();
        for row in sheet.rows.iter().take(self.options.metadata_scan_rows) {
            let text = row
                .iter()
                .filter(|c| !c.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            let lower = text.to_lowercase();

            if meta.activity_date.is_none() {
                meta.activity_date = date_after(&text, "activity date");
            }
            if meta.report_date.is_none() {
                meta.report_date = date_after(&text, "report date");
            }
            if meta.unit.is_none() {
                meta.unit = UNITS
                    .iter()
                    .find(|(needle, _)| lower.contains(needle))
                    .map(|(_, unit)| *unit);
            }
        }
        meta
    }

    fn find_header(&self, sheet: &Sheet) -> ParseResult<Columns> {
        let window = self.options.header_search_rows;
        sheet
            .rows
            .iter()
            .take(window)
            .enumerate()
            .find_map(|(i, row)| header_columns(i, row))
            .ok_or(ParseError::TableNotFound { window })
    }
}

/// Date printed after `label` (ASCII, matched case-insensitively) on the same row.
fn date_after(text: &str, label: &str) -> Option<NaiveDate> {
    let at = text
        .as_bytes()
        .windows(label.len())
        .position(|w| w.eq_ignore_ascii_case(label.as_bytes()))?;
    text.get(at + label.len()..).and_then(find_date)
}

fn header_columns(row_index: usize, row: &[String]) -> Option<Columns> {
    let mut depository = None;
    let mut registered = None;
    let mut eligible = None;
    let mut total = None;
    // later cells win: "Prev Total | Received | Total Today" maps total to today's column
    for (i, cell) in row.iter().enumerate() {
        let lower = cell.to_lowercase();
        if is_header_label(&lower) {
            depository = Some(i);
        } else if lower.contains("registered") {
            registered = Some(i);
        } else if lower.contains("eligible") {
            eligible = Some(i);
        } else if lower.contains("total") {
            total = Some(i);
        }
    }
    let depository = depository?;
    if registered.is_none() && eligible.is_none() && total.is_none() {
        return None;
    }
    Some(Columns {
        header_row: row_index,
        depository,
        registered,
        eligible,
        total,
    })
}

fn is_header_label(cell: &str) -> bool {
    let lower = cell.to_lowercase();
    lower.contains("depository") || lower.contains("warehouse")
}

fn is_summary(cell: &str) -> bool {
    let lower = cell.to_lowercase();
    lower == "total" || lower.starts_with("total ") || lower.ends_with(" total")
}
