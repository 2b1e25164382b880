//! Delivery notice parsing (issues and stops reports).
//!
//! Each contract's figures are printed as a `CONTRACT:` announcement followed
//! by a small table with `TOTAL` and `MONTH TO DATE` rows, repeated per
//! contract and spread over several pages. Pages are scanned independently
//! and announcements are zipped with the tables that follow them. The intent
//! date is printed once per document.

pub mod layout;

use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::dates::find_date;
use crate::errors::{ParseError, ParseResult};
use crate::models::{DeliveryRecord, ReportType};
use crate::numeric;
use crate::source::load_pages;
use layout::{Announcement, PageLayout, Summary, Table, is_multi_month_header, scan_page};

static INTENT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bINTENT\s+DATE\b[\s:]*(.*)").expect("intent date regex"));
static BUSINESS_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bBUSINESS\s+DATE\b[\s:]*(.*)").expect("business date regex"));
static DAILY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bDAILY\b").expect("daily regex"));
static MONTHLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bMONTHLY\b").expect("monthly regex"));

/// Records extracted from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryParse {
    pub records: Vec<DeliveryRecord>,
    pub report_type: ReportType,
    pub intent_date: NaiveDate,
    /// Contracts whose figures were not counts.
    pub dropped_contracts: usize,
    /// Tables with no announcement to belong to.
    pub orphan_tables: usize,
}

/// Stateless parser for delivery notice documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryNoticeParser;

impl DeliveryNoticeParser {
    pub fn new() -> Self {
        Self
    }

    /// Loads `path` (PDF or form-feed separated text) and parses it.
    ///
    /// `hint` is the report type read off the file name, if any.
    pub fn parse_path(&self, path: &Path, hint: Option<ReportType>) -> ParseResult<DeliveryParse> {
        let pages = load_pages(path)?;
        let source_file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = self.parse_pages(&pages, hint, &source_file)?;
        info!(
            file = %source_file,
            pages = pages.len(),
            report_type = %parsed.report_type,
            records = parsed.records.len(),
            "parsed delivery notice"
        );
        Ok(parsed)
    }

    /// Parses ordered page texts.
    pub fn parse_pages<S: AsRef<str>>(
        &self,
        pages: &[S],
        hint: Option<ReportType>,
        source_file: &str,
    ) -> ParseResult<DeliveryParse> {
        let layouts: Vec<PageLayout> = pages.iter().map(|p| scan_page(p.as_ref())).collect();

        let has_aggregates = layouts
            .iter()
            .flat_map(|l| &l.tables)
            .any(|t| t.summary_row(Summary::Total).is_some() || t.summary_row(Summary::MonthToDate).is_some());
        let has_keyword = matches!(hint, Some(ReportType::Daily | ReportType::Monthly))
            || pages
                .iter()
                .any(|p| DAILY.is_match(p.as_ref()) || MONTHLY.is_match(p.as_ref()));
        // a bare "YTD" in a banner is not a cue, only the per-firm month grid is
        let ytd_cues = hint == Some(ReportType::Ytd)
            || pages
                .iter()
                .any(|p| p.as_ref().lines().any(is_multi_month_header));

        if ytd_cues && !(has_keyword && has_aggregates) {
            return Err(ParseError::UnsupportedLayout(
                "year-to-date delivery report".into(),
            ));
        }
        if !has_aggregates {
            return Err(ParseError::Structure(
                "no TOTAL or MONTH TO DATE rows found".into(),
            ));
        }

        let report_type = report_type(pages, hint);
        let intent_date = intent_date(pages)?;

        let mut out = DeliveryParse {
            records: Vec::new(),
            report_type,
            intent_date,
            dropped_contracts: 0,
            orphan_tables: 0,
        };
        for (page_no, page) in layouts.iter().enumerate() {
            let (pairs, orphans) = pair(page);
            if orphans > 0 {
                debug!(page = page_no + 1, orphans, "discarding unclaimed tables");
            }
            out.orphan_tables += orphans;
            for (announcement, table) in pairs {
                match contract_record(announcement, table, &out, source_file) {
                    Ok(record) => out.records.push(record),
                    Err(ContractError::Structure) => {
                        return Err(ParseError::Structure(format!(
                            "{} {} table on page {} has neither TOTAL nor MONTH TO DATE row",
                            announcement.product,
                            announcement.contract_month,
                            page_no + 1
                        )));
                    }
                    Err(ContractError::Format(e)) => {
                        warn!(
                            product = %announcement.product,
                            contract = %announcement.contract_month,
                            error = %e,
                            "dropping contract"
                        );
                        out.dropped_contracts += 1;
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Pairs each announcement with the first table between it and the next
/// announcement. Returns the pairs and the number of unclaimed tables.
fn pair(page: &PageLayout) -> (Vec<(&Announcement, &Table)>, usize) {
    let mut pairs = Vec::new();
    let mut claimed = 0;
    for (i, announcement) in page.announcements.iter().enumerate() {
        let next = page
            .announcements
            .get(i + 1)
            .map_or(usize::MAX, |a| a.line);
        match page
            .tables
            .iter()
            .find(|t| t.line > announcement.line && t.line < next)
        {
            Some(table) => {
                pairs.push((announcement, table));
                claimed += 1;
            }
            None => debug!(
                product = %announcement.product,
                contract = %announcement.contract_month,
                "announcement without a table"
            ),
        }
    }
    (pairs, page.tables.len() - claimed)
}

enum ContractError {
    Structure,
    Format(crate::errors::FormatError),
}

fn contract_record(
    announcement: &Announcement,
    table: &Table,
    doc: &DeliveryParse,
    source_file: &str,
) -> Result<DeliveryRecord, ContractError> {
    let first_count = |kind: Summary| -> Option<Result<u64, ContractError>> {
        let row = table.summary_row(kind)?;
        let raw = row.values.first()?;
        Some(numeric::parse_count(raw).map_err(ContractError::Format))
    };
    let total = first_count(Summary::Total).transpose()?;
    let month_to_date = first_count(Summary::MonthToDate).transpose()?;
    if total.is_none() && month_to_date.is_none() {
        return Err(ContractError::Structure);
    }
    let daily_total = total.unwrap_or(0);
    Ok(DeliveryRecord {
        intent_date: doc.intent_date,
        product: announcement.product.clone(),
        contract_month: announcement.contract_month.clone(),
        daily_total,
        cumulative: month_to_date.unwrap_or(daily_total),
        report_type: doc.report_type,
        source_file: source_file.to_string(),
    })
}

/// Keyword in the document wins; the file-name hint breaks ties.
fn report_type<S: AsRef<str>>(pages: &[S], hint: Option<ReportType>) -> ReportType {
    let daily = pages.iter().any(|p| DAILY.is_match(p.as_ref()));
    let monthly = pages.iter().any(|p| MONTHLY.is_match(p.as_ref()));
    match (daily, monthly) {
        (true, false) => ReportType::Daily,
        (false, true) => ReportType::Monthly,
        _ => match hint {
            Some(ReportType::Monthly) => ReportType::Monthly,
            _ => ReportType::Daily,
        },
    }
}

fn intent_date<S: AsRef<str>>(pages: &[S]) -> ParseResult<NaiveDate> {
    for label in [&*INTENT_DATE, &*BUSINESS_DATE] {
        let found = pages.iter().find_map(|p| {
            p.as_ref()
                .lines()
                .filter_map(|line| label.captures(line))
                .find_map(|caps| find_date(&caps[1]))
        });
        if let Some(date) = found {
            return Ok(date);
        }
    }
    Err(ParseError::MetadataNotFound("INTENT DATE".into()))
}
