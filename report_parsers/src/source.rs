//! Loaders that turn files on disk into grids of cell text or page text.

use std::fs;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::debug;

use crate::errors::{ParseError, ParseResult};

/// A worksheet flattened to trimmed cell strings, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Builds a sheet from CSV text.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> ParseResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.trim().to_string()).collect());
        }
        Ok(Self { rows })
    }

    /// Cell text, empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Loads the first worksheet of a CSV, XLS or XLSX file.
pub fn load_sheet(path: &Path) -> ParseResult<Sheet> {
    match extension(path).as_str() {
        "csv" => Sheet::from_csv_reader(fs::File::open(path)?),
        "xls" | "xlsx" | "xlsm" => {
            let mut workbook =
                open_workbook_auto(path).map_err(|e| ParseError::Workbook(e.to_string()))?;
            let first = workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ParseError::Workbook("workbook has no sheets".into()))?;
            let range = workbook
                .worksheet_range(&first)
                .map_err(|e| ParseError::Workbook(e.to_string()))?;
            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_text).collect())
                .collect();
            debug!(sheet = %first, rows = rows.len(), "loaded worksheet");
            Ok(Sheet { rows })
        }
        other => Err(ParseError::UnsupportedSource(format!(
            "{} (extension {other:?})",
            path.display()
        ))),
    }
}

/// Loads page texts in order. PDFs go through `lopdf`; `.txt` dumps use form
/// feeds as page breaks.
pub fn load_pages(path: &Path) -> ParseResult<Vec<String>> {
    match extension(path).as_str() {
        "pdf" => {
            let doc = lopdf::Document::load(path).map_err(|e| ParseError::Pdf(e.to_string()))?;
            let mut pages = Vec::new();
            for page_number in doc.get_pages().keys() {
                match doc.extract_text(&[*page_number]) {
                    Ok(text) => pages.push(text),
                    Err(e) => {
                        debug!(page = page_number, error = %e, "page has no extractable text");
                        pages.push(String::new());
                    }
                }
            }
            Ok(pages)
        }
        "txt" => Ok(split_pages(&fs::read_to_string(path)?)),
        other => Err(ParseError::UnsupportedSource(format!(
            "{} (extension {other:?})",
            path.display()
        ))),
    }
}

/// Splits a text dump into pages on form feed characters.
pub fn split_pages(text: &str) -> Vec<String> {
    text.split('\u{c}').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_rows_are_ragged_and_trimmed() {
        let sheet = Sheet::from_csv_reader("a, b\n\"1,000\"\n".as_bytes()).unwrap();
        assert_eq!(sheet.rows, vec![vec!["a", "b"], vec!["1,000"]]);
        assert_eq!(sheet.cell(1, 0), "1,000");
        assert_eq!(sheet.cell(1, 5), "");
        assert_eq!(sheet.cell(9, 0), "");
    }

    #[test]
    fn text_dump_pages() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "page one\n\u{c}page two\n").unwrap();
        let pages = load_pages(file.path()).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[1].starts_with("page two"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_sheet(Path::new("report.json")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedSource(_)));
        let err = load_pages(Path::new("report.doc")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedSource(_)));
    }
}
