use thiserror::Error;

/// A single field could not be read as a number.
///
/// Row-scoped: parsers drop the offending row (or contract) and keep going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a valid {expected}: {raw:?}")]
pub struct FormatError {
    /// The text as it appeared in the document.
    pub raw: String,
    /// What the caller was trying to read ("number", "count", "quantity").
    pub expected: &'static str,
}

impl FormatError {
    pub(crate) fn new(raw: &str, expected: &'static str) -> Self {
        Self {
            raw: raw.to_string(),
            expected,
        }
    }
}

/// The unified, document-scoped error type for the `report_parsers` crate.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A required metadata line (e.g. "Activity Date") is absent.
    #[error("Metadata not found: {0}")]
    MetadataNotFound(String),

    /// No header row was found inside the bounded search window.
    #[error("Table header not found within the first {window} rows")]
    TableNotFound {
        /// How many rows were probed.
        window: usize,
    },

    /// The document is a recognized layout that this crate does not parse
    /// (the year-to-date delivery report). Callers map this to "skipped".
    #[error("Unsupported layout: {0}")]
    UnsupportedLayout(String),

    /// The document is structurally broken in a way that prevents extraction.
    #[error("Malformed document: {0}")]
    Structure(String),

    /// The document parsed but produced no usable records.
    #[error("No records could be extracted")]
    NoRecords,

    /// A field-level error that escaped row-level handling.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The file extension has no loader.
    #[error("Unsupported source format: {0}")]
    UnsupportedSource(String),

    /// Reading the spreadsheet workbook failed.
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// Reading the PDF failed.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Reading a CSV file failed.
    #[error("CSV error")]
    Csv(#[from] csv::Error),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// `true` for the recognized-but-unsupported layout signal.
    pub fn is_unsupported_layout(&self) -> bool {
        matches!(self, ParseError::UnsupportedLayout(_))
    }
}

/// Result alias used across the parsers.
pub type ParseResult<T> = Result<T, ParseError>;
