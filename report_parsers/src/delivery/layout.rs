//! Line-level layout of a delivery notice page.
//!
//! Text extraction flattens each page to lines. Every line is classified once,
//! then consecutive tabular lines are grouped into tables. Contract
//! announcements and the tables that follow them are returned in page order
//! with their line numbers so the caller can pair them positionally.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::models::Product;
use crate::numeric;

const MONTHS: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// Words in a contract descriptor that name the venue, not the product.
const VENUES: [&str; 4] = ["COMEX", "NYMEX", "CME", "CBOT"];

static ANNOUNCEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)CONTRACT:\s*([A-Z]+)\s+(\d{4})\s+(.+?)(?:\s+FUTURES\b.*)?\s*$")
        .expect("announcement regex")
});

static METADATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[A-Za-z][A-Za-z0-9 .#/&()-]*:\s*\S").expect("metadata regex")
});

static PAGE_FOOTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*page\s*:?\s*\d+(\s*(of|/)\s*\d+)?\s*$").expect("page footer regex")
});

/// Which aggregate a summary row carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    /// Current period figure.
    Total,
    /// Month-to-date (cumulative) figure.
    MonthToDate,
}

/// One tabular line: a text label followed by numeric cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub label: String,
    pub values: Vec<String>,
}

impl TableRow {
    pub fn summary(&self) -> Option<Summary> {
        summary_kind(&self.label)
    }
}

/// A maximal run of tabular lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Line index of the first row on the page.
    pub line: usize,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// First row carrying the given aggregate.
    pub fn summary_row(&self, kind: Summary) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.summary() == Some(kind))
    }
}

/// A contract announcement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub line: usize,
    pub product: Product,
    /// "JANUARY 2026"
    pub contract_month: String,
}

/// Announcements and tables found on one page, each in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLayout {
    pub announcements: Vec<Announcement>,
    pub tables: Vec<Table>,
}

#[derive(Debug, PartialEq, Eq)]
enum Line {
    /// Does not open or close a table.
    Transparent,
    /// Closes any open table.
    Break,
    Announcement(Option<(Product, String)>),
    Row(TableRow),
}

/// Splits a page into announcements and tables.
pub fn scan_page(text: &str) -> PageLayout {
    let mut layout = PageLayout::default();
    let mut open: Option<Table> = None;

    for (i, raw) in text.lines().enumerate() {
        match classify_line(raw) {
            Line::Transparent => {}
            Line::Row(row) => open
                .get_or_insert_with(|| Table {
                    line: i,
                    rows: Vec::new(),
                })
                .rows
                .push(row),
            other => {
                layout.tables.extend(open.take());
                if let Line::Announcement(Some((product, contract_month))) = other {
                    layout.announcements.push(Announcement {
                        line: i,
                        product,
                        contract_month,
                    });
                }
            }
        }
    }
    layout.tables.extend(open);
    layout
}

fn classify_line(raw: &str) -> Line {
    let line = raw.trim();
    if line.is_empty() || PAGE_FOOTER.is_match(line) || is_rule(line) {
        return Line::Transparent;
    }
    if let Some(caps) = ANNOUNCEMENT.captures(line) {
        return Line::Announcement(announcement(&caps[1], &caps[2], &caps[3]));
    }
    let Some(row) = split_row(line) else {
        return Line::Break;
    };
    if row.summary().is_some() || !METADATA.is_match(line) {
        Line::Row(row)
    } else {
        Line::Break
    }
}

fn announcement(month: &str, year: &str, descriptor: &str) -> Option<(Product, String)> {
    let month = month.to_uppercase();
    if !MONTHS.contains(&month.as_str()) {
        warn!(%month, "ignoring contract announcement with unknown month");
        return None;
    }
    let words: Vec<&str> = descriptor
        .split_whitespace()
        .filter(|w| {
            !VENUES.iter().any(|v| w.eq_ignore_ascii_case(v))
                && !w.chars().all(|c| c.is_ascii_digit() || c == ',')
        })
        .collect();
    let product = Product::from_descriptor(&words.join(" "))?;
    Some((product, format!("{month} {year}")))
}

/// Horizontal rules drawn with dashes, underscores or equals signs.
fn is_rule(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| matches!(c, '-' | '_' | '=' | ' ' | '+'))
}

/// Label plus trailing numeric cells, or `None` when the line has no numbers.
fn split_row(line: &str) -> Option<TableRow> {
    // "TOTAL:15" and "A | 1 | 2" tokenize like "TOTAL: 15" and "A 1 2"
    let spaced = line.replace(':', ": ").replace('|', " ");
    let tokens: Vec<&str> = spaced.split_whitespace().collect();
    let split = tokens
        .iter()
        .rposition(|t| !numeric::is_numeric(t))
        .map_or(0, |i| i + 1);
    if split == tokens.len() {
        return None;
    }
    Some(TableRow {
        label: tokens[..split].join(" "),
        values: tokens[split..].iter().map(|t| t.to_string()).collect(),
    })
}

fn summary_kind(label: &str) -> Option<Summary> {
    let normalized = label
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_uppercase()
        .replace('-', " ");
    match normalized.as_str() {
        "TOTAL" => Some(Summary::Total),
        "MONTH TO DATE" | "MTD" | "CUMULATIVE" => Some(Summary::MonthToDate),
        _ => None,
    }
}

/// A header listing three or more month abbreviations (the year-to-date grid).
pub fn is_multi_month_header(line: &str) -> bool {
    let mut seen: Vec<&str> = Vec::new();
    for token in line.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_ascii_alphabetic());
        if token.len() == 3 {
            if let Some(m) = MONTHS.iter().copied().find(|m| m[..3].eq_ignore_ascii_case(token)) {
                if !seen.contains(&m) {
                    seen.push(m);
                }
            }
        }
    }
    seen.len() >= 3
}
