//! File-name based document classification.
//!
//! The download stage names files `<YYYYMMDD>_<content token>_<original>.<ext>`,
//! so the name alone is enough to route a file to a parser.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Product, ReportType};

/// Extensions the pipeline picks up from the input directory.
pub const CANDIDATE_EXTENSIONS: [&str; 6] = ["csv", "xls", "xlsx", "xlsm", "pdf", "txt"];

/// Which parser a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentKind {
    Inventory,
    Delivery,
    Unrecognized,
}

impl DocumentKind {
    /// Value stored in the ledger's `file_kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Inventory => "inventory",
            DocumentKind::Delivery => "delivery",
            DocumentKind::Unrecognized => "unknown",
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory" => Ok(DocumentKind::Inventory),
            "delivery" => Ok(DocumentKind::Delivery),
            "unknown" => Ok(DocumentKind::Unrecognized),
            other => Err(format!("unknown file kind: {other}")),
        }
    }
}

/// Everything that can be read off a file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub kind: DocumentKind,
    /// Base metal named in the file (inventory snapshots only carry it here).
    pub product: Option<Product>,
    /// Report variant hint for delivery notices.
    pub report_type: Option<ReportType>,
    /// Date prefix written by the download stage.
    pub file_date: Option<NaiveDate>,
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// `true` when the file has an extension the pipeline can load.
pub fn is_candidate(path: &Path) -> bool {
    extension(path).is_some_and(|ext| CANDIDATE_EXTENSIONS.contains(&ext.as_str()))
}

/// Classifies a file by its name. Content tokens win over the extension.
pub fn classify(path: &Path) -> Classification {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let lower = name.to_lowercase();

    let kind = if lower.contains("stock") {
        DocumentKind::Inventory
    } else if lower.contains("delivery") || lower.contains("notice") {
        DocumentKind::Delivery
    } else {
        match extension(path).as_deref() {
            Some("csv" | "xls" | "xlsx" | "xlsm") => DocumentKind::Inventory,
            Some("pdf" | "txt") => DocumentKind::Delivery,
            _ => DocumentKind::Unrecognized,
        }
    };

    Classification {
        kind,
        product: match kind {
            DocumentKind::Inventory => Product::from_file_name(name),
            _ => None,
        },
        report_type: match kind {
            DocumentKind::Delivery => ReportType::from_file_name(name),
            _ => None,
        },
        file_date: file_date(name),
    }
}

/// Reads the `YYYYMMDD` prefix of a file name.
pub fn file_date(name: &str) -> Option<NaiveDate> {
    let prefix = name.get(..8)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(prefix, "%Y%m%d").ok()
}
