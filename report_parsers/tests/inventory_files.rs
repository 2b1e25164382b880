use std::fs;

use chrono::NaiveDate;
use report_parsers::{DocumentKind, InventoryReportParser, ParseError, Product, classify};
use tempfile::TempDir;

const GOLD_CSV: &str = "\
COMEX Gold Depository Stocks,,,
\"Report Date: January 13, 2026\",,,
Activity Date: 01/12/2026,,,
Troy Ounce,,,
,,,
DEPOSITORY,REGISTERED,ELIGIBLE,TOTAL
BRINKS,\"10,500.25\",\"2,000.00\",\"12,500.25\"
\"HSBC BANK USA, N.A.\",\"1,000\",N/A,\"1,000\"
,,,
TOTAL,\"11,500.25\",\"2,000.00\",\"13,500.25\"
";

#[test]
fn csv_snapshot_through_classifier() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("20260112_gold_stocks_Gold_Stocks.csv");
    fs::write(&path, GOLD_CSV).unwrap();

    let class = classify(&path);
    assert_eq!(class.kind, DocumentKind::Inventory);
    let product = class.product.unwrap();

    let parsed = InventoryReportParser::default()
        .parse_path(&path, &product)
        .unwrap();
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.dropped_rows, 0);

    let brinks = &parsed.records[0];
    assert_eq!(brinks.product, Product::Gold);
    assert_eq!(brinks.activity_date, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
    assert_eq!(brinks.report_date, NaiveDate::from_ymd_opt(2026, 1, 13));
    assert_eq!(
        (brinks.registered, brinks.eligible, brinks.total),
        (Some(10500.25), Some(2000.0), Some(12500.25))
    );
    assert!(parsed.records.iter().all(|r| r.is_balanced()));

    let hsbc = &parsed.records[1];
    assert_eq!(hsbc.depository, "HSBC BANK USA, N.A.");
    assert_eq!(hsbc.eligible, None);
}

#[test]
fn reparsing_is_side_effect_free() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("silver_stocks.csv");
    fs::write(&path, GOLD_CSV).unwrap();
    let parser = InventoryReportParser::default();
    let first = parser.parse_path(&path, &Product::Silver).unwrap();
    let second = parser.parse_path(&path, &Product::Silver).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_file_and_garbage_workbook() {
    let dir = TempDir::new().unwrap();
    let parser = InventoryReportParser::default();

    let err = parser
        .parse_path(&dir.path().join("absent.csv"), &Product::Gold)
        .unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));

    let xls = dir.path().join("gold_stocks.xls");
    fs::write(&xls, b"not a workbook").unwrap();
    let err = parser.parse_path(&xls, &Product::Gold).unwrap_err();
    assert!(matches!(err, ParseError::Workbook(_)));
}
