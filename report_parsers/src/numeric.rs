//! Locale-formatted numeric text normalization.
//!
//! Report cells carry thousands separators, stray spaces (including
//! non-breaking ones from PDF extraction) and the occasional "N/A". Everything
//! here goes through [`clean`] first:
//!
//! ```
//! use report_parsers::numeric;
//!
//! assert_eq!(numeric::parse_f64(" 10,500.25 ").unwrap(), 10500.25);
//! assert_eq!(numeric::parse_count("1,234").unwrap(), 1234);
//! assert_eq!(numeric::parse_optional_f64("N/A").unwrap(), None);
//! assert!(numeric::parse_f64("12/01/2026").is_err());
//! ```

use crate::errors::FormatError;

/// Markers that mean "no value" rather than "bad value".
const NOT_AVAILABLE: [&str; 5] = ["N/A", "NA", "-", "NULL", "NONE"];

/// Strips grouping separators and every kind of whitespace.
pub fn clean(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect()
}

/// `true` when the cell is blank or one of the not-available markers.
pub fn is_absent(raw: &str) -> bool {
    let t = raw.trim();
    t.is_empty() || NOT_AVAILABLE.iter().any(|m| t.eq_ignore_ascii_case(m))
}

/// `true` when [`parse_f64`] would succeed.
pub fn is_numeric(raw: &str) -> bool {
    parse_f64(raw).is_ok()
}

/// Parses a real number.
pub fn parse_f64(raw: &str) -> Result<f64, FormatError> {
    let cleaned = clean(raw);
    // `f64::from_str` accepts "inf"/"nan"; report figures never use them.
    if cleaned.is_empty() || !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return Err(FormatError::new(raw, "number"));
    }
    let value: f64 = cleaned
        .parse()
        .map_err(|_| FormatError::new(raw, "number"))?;
    if !value.is_finite() {
        return Err(FormatError::new(raw, "number"));
    }
    Ok(value)
}

/// Parses a real number, mapping blank / not-available cells to `None`.
pub fn parse_optional_f64(raw: &str) -> Result<Option<f64>, FormatError> {
    if is_absent(raw) {
        return Ok(None);
    }
    parse_f64(raw).map(Some)
}

/// Parses a non-negative quantity (inventory ounces, tons, ...).
pub fn parse_quantity(raw: &str) -> Result<Option<f64>, FormatError> {
    match parse_optional_f64(raw)? {
        Some(v) if v < 0.0 => Err(FormatError::new(raw, "non-negative quantity")),
        other => Ok(other),
    }
}

/// Parses a non-negative integer count (contracts issued / stopped).
///
/// `"15.0"` is accepted because spreadsheet exports render whole numbers that way.
pub fn parse_count(raw: &str) -> Result<u64, FormatError> {
    let cleaned = clean(raw);
    if let Ok(n) = cleaned.parse::<u64>() {
        return Ok(n);
    }
    let value = parse_f64(raw).map_err(|_| FormatError::new(raw, "count"))?;
    if value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return Err(FormatError::new(raw, "count"));
    }
    Ok(value as u64)
}
