//! Date extraction from free-form metadata text.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Formats seen in exchange report headers, tried in order.
const FORMATS: [&str; 6] = [
    "%B %d, %Y", // January 13, 2024
    "%m/%d/%Y",  // 01/13/2024
    "%Y-%m-%d",  // 2024-01-13
    "%d-%b-%Y",  // 13-Jan-2024
    "%d/%m/%Y",  // 13/01/2024 (only reached when the month slot is > 12)
    "%Y/%m/%d",  // 2024/01/13
];

static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        [A-Za-z]+\s+\d{1,2},\s*\d{4}      # January 13, 2024
      | \d{4}[-/]\d{1,2}[-/]\d{1,2}       # 2024-01-13, 2024/01/13
      | \d{1,2}/\d{1,2}/\d{4}             # 01/13/2024
      | \d{1,2}-[A-Za-z]{3}-\d{4}         # 13-Jan-2024
        ",
    )
    .expect("date token regex")
});

/// Parses a string that is exactly one date in any supported format.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Returns the first parseable date embedded anywhere in `text`.
///
/// Handles metadata lines such as `"Activity Date: 01/12/2026  (preliminary)"`.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    DATE_TOKEN
        .find_iter(text)
        .find_map(|m| parse_date(m.as_str()))
}
