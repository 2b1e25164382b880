#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use report_etl::store::{IngestionStore, StoreOptions};
use report_parsers::{DeliveryRecord, InventoryRecord, Product, ReportType};
use tempfile::TempDir;

pub const GOLD_CSV: &str = "\
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

pub const DAILY_DUMP: &str = "\
CME CLEARING                                     DAILY DELIVERY NOTICES
BUSINESS DATE: 01/09/2026                        RUN DATE: 01/12/2026
CONTRACT: JANUARY 2026 COMEX 100 GOLD FUTURES
INTENT DATE: 01/12/2026                          DELIVERY DATE: 01/14/2026
FIRM  ORG  FIRM NAME                    ISSUED      STOPPED
072   C    GOLDMAN                          10
905   C    ADM                                           10
                 TOTAL:                     10           10
                 MONTH TO DATE:                       1,204
\u{c}CME CLEARING                                     DAILY DELIVERY NOTICES
CONTRACT: JANUARY 2026 ALUMINUM FUTURES
FIRM  ORG  FIRM NAME                    ISSUED      STOPPED
118   C    MACQUARIE                        15           15
                 TOTAL:                     15           15
                 MONTH TO DATE:                         134
";

pub const YTD_DUMP: &str = "YEAR TO DATE\nFIRM   JAN   FEB   MAR\n072 C GOLDMAN   10   20   30\n";

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct LockingMode {
    #[diesel(sql_type = Text)]
    locking_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestStore {
    pub dir: TempDir,  // keep alive for the life of the test
    pub path: PathBuf, // <tmpdir>/db/test.db
}

pub fn setup_store() -> (TestStore, IngestionStore) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("db").join("test.db");
    let store = IngestionStore::open(&path, StoreOptions::default()).expect("open store");
    (TestStore { dir, path }, store)
}

pub fn assert_store_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let lm: LockingMode = sql_query("PRAGMA locking_mode;").get_result(conn).unwrap();
    assert_eq!(lm.locking_mode.to_lowercase(), "exclusive");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn inventory(day: NaiveDate, product: Product, depository: &str, registered: f64, eligible: f64) -> InventoryRecord {
    InventoryRecord {
        activity_date: day,
        product,
        depository: depository.to_string(),
        registered: Some(registered),
        eligible: Some(eligible),
        total: Some(registered + eligible),
        unit: "Troy Ounces".to_string(),
        report_date: None,
    }
}

pub fn delivery(
    day: NaiveDate,
    product: Product,
    contract_month: &str,
    report_type: ReportType,
    daily_total: u64,
    cumulative: u64,
) -> DeliveryRecord {
    DeliveryRecord {
        intent_date: day,
        product,
        contract_month: contract_month.to_string(),
        daily_total,
        cumulative,
        report_type,
        source_file: "notice.pdf".to_string(),
    }
}
