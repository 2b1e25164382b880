//! Directory-driven ingestion run.
//!
//! ## What this does
//! - Lists candidate files in the input directory (non-recursive, sorted by name).
//! - Skips files the ledger already marks `success` or `skipped`, unless
//!   [`EtlOptions::reprocess`] is set.
//! - Classifies, parses and persists each remaining file **independently**; a
//!   failing file never stops the run.
//! - Writes exactly one ledger entry per file that entered the pipeline.
//! - Optionally moves successful files under `<archive_dir>/<YYYY-MM>/`.
//!
//! ## Per-file lifecycle
//! `Discovered → Classified → Parsed → Persisted → Logged → (Archived)`, with
//! `ClassificationFailed`, `ParseFailed` and `PersistFailed` as failure
//! terminals and `Skipped` for recognized documents that are not parsed.
//!
//! ## Consistency
//! Record upserts and the ledger write are separate statements. A run killed
//! between them leaves records without a ledger entry; the next run reparses
//! the file and the natural-key upserts converge to the same rows.

pub mod archive;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use report_parsers::{
    DeliveryNoticeParser, DocumentKind, InventoryParserOptions, InventoryReportParser, ParseError,
    classify, classify::is_candidate,
};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};
use walkdir::WalkDir;

use crate::store::{IngestionRepo, LedgerEntry, LedgerStatus, StoreResult, UpsertReport};

/// Run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlOptions {
    /// Directory scanned for report files.
    pub data_dir: PathBuf,
    /// Root of the archive tree.
    pub archive_dir: PathBuf,
    /// Reparse files the ledger already marks `success` or `skipped`.
    pub reprocess: bool,
    /// Move successful files into the archive after logging them.
    pub archive: bool,
}

/// Where a file ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileState {
    /// Listed by the directory scan.
    Discovered,
    /// Routed to a parser.
    Classified,
    /// Records extracted.
    Parsed,
    /// Records upserted (possibly with some row failures).
    Persisted,
    /// Ledger entry written.
    Logged,
    /// Moved into the archive.
    Archived,
    /// The file name matched no report kind or named no product.
    ClassificationFailed,
    /// The document could not be parsed.
    ParseFailed,
    /// Every record failed to persist.
    PersistFailed,
    /// Recognized but not parsed (year-to-date delivery report).
    Skipped,
}

impl FileState {
    /// Ledger status written for a file that stopped in this state.
    pub fn ledger_status(self) -> LedgerStatus {
        match self {
            FileState::ClassificationFailed | FileState::ParseFailed | FileState::PersistFailed => {
                LedgerStatus::Failed
            }
            FileState::Skipped => LedgerStatus::Skipped,
            _ => LedgerStatus::Success,
        }
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Path as scanned.
    pub path: PathBuf,
    /// Ledger key (absolute path).
    pub ledger_key: String,
    /// Classified kind.
    pub kind: DocumentKind,
    /// Final state.
    pub state: FileState,
    /// Status written to the ledger.
    pub status: LedgerStatus,
    /// Rows written to the record tables.
    pub records: u64,
    /// Rows that failed to persist.
    pub row_failures: usize,
    /// Failure or partial-failure note, as written to the ledger.
    pub message: Option<String>,
}

/// Counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Candidate files found in the input directory.
    pub discovered: usize,
    /// Candidates left alone because the ledger already had them.
    pub already_processed: usize,
    /// Files that entered the pipeline.
    pub processed: usize,
    /// Files logged as `success`.
    pub succeeded: usize,
    /// Files logged as `failed`.
    pub failed: usize,
    /// Files logged as `skipped`.
    pub skipped: usize,
    /// Successful files moved into the archive.
    pub archived: usize,
    /// Record rows inserted or updated.
    pub records_upserted: u64,
    /// Record rows that failed to persist, across all files.
    pub row_failures: usize,
}

impl RunSummary {
    /// `true` when any file ended with a `failed` ledger entry.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    fn tally(&mut self, outcome: &FileOutcome) {
        self.processed += 1;
        match outcome.status {
            LedgerStatus::Success => self.succeeded += 1,
            LedgerStatus::Failed => self.failed += 1,
            LedgerStatus::Skipped => self.skipped += 1,
        }
        self.records_upserted += outcome.records;
        self.row_failures += outcome.row_failures;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run summary")?;
        writeln!(f, "-----------")?;
        writeln!(f, "discovered         {}", self.discovered)?;
        writeln!(f, "already processed  {}", self.already_processed)?;
        writeln!(f, "processed          {}", self.processed)?;
        writeln!(f, "  succeeded        {}", self.succeeded)?;
        writeln!(f, "  failed           {}", self.failed)?;
        writeln!(f, "  skipped          {}", self.skipped)?;
        writeln!(f, "archived           {}", self.archived)?;
        writeln!(f, "records upserted   {}", self.records_upserted)?;
        write!(f, "row failures       {}", self.row_failures)
    }
}

/// Lists candidate report files directly inside `dir`, sorted by file name.
pub fn scan_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("scan input directory {}", dir.display()))?;
        if entry.file_type().is_file() && is_candidate(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Key the ledger stores for `path`.
pub fn ledger_key(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// Drives parsers and a repository over an input directory.
#[derive(Debug)]
pub struct Etl<R> {
    repo: R,
    options: EtlOptions,
    inventory: InventoryReportParser,
    delivery: DeliveryNoticeParser,
    outcomes: Vec<FileOutcome>,
}

enum Parsed {
    Inventory(Vec<report_parsers::InventoryRecord>),
    Delivery(Vec<report_parsers::DeliveryRecord>),
}

impl<R: IngestionRepo> Etl<R> {
    /// Builds a run over `repo`.
    pub fn new(repo: R, options: EtlOptions, inventory_options: InventoryParserOptions) -> Self {
        Self {
            repo,
            options,
            inventory: InventoryReportParser::new(inventory_options),
            delivery: DeliveryNoticeParser::new(),
            outcomes: Vec::new(),
        }
    }

    /// Run settings.
    pub fn options(&self) -> &EtlOptions {
        &self.options
    }

    /// Outcomes of the files the last [`Etl::run`] processed, in scan order.
    ///
    /// Files skipped as already processed are not listed. Archived files
    /// carry [`FileState::Archived`].
    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    /// The repository, for queries between runs.
    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    /// Gives the repository back.
    pub fn into_repo(self) -> R {
        self.repo
    }

    /// Processes every candidate file in the input directory.
    ///
    /// Errors only for run-fatal conditions: an unreadable input directory or
    /// a store that stops answering ledger queries.
    pub fn run(&mut self) -> anyhow::Result<RunSummary> {
        self.outcomes.clear();
        let files = scan_files(&self.options.data_dir)?;
        let mut summary = RunSummary {
            discovered: files.len(),
            ..RunSummary::default()
        };
        info!(
            dir = %self.options.data_dir.display(),
            files = files.len(),
            reprocess = self.options.reprocess,
            "starting ingestion run"
        );

        for path in files {
            let key = ledger_key(&path);
            if !self.options.reprocess
                && self
                    .repo
                    .is_processed(&key)
                    .with_context(|| format!("ledger lookup for {key}"))?
            {
                debug!(file = %key, "already processed");
                summary.already_processed += 1;
                continue;
            }

            let mut outcome = self
                .process_file(&path)
                .with_context(|| format!("record outcome for {key}"))?;
            summary.tally(&outcome);

            if self.options.archive && outcome.status == LedgerStatus::Success {
                let file_date = classify(&path).file_date;
                match archive::archive_file(&path, &self.options.archive_dir, file_date, Utc::now()) {
                    Ok(dest) => {
                        info!(file = %path.display(), to = %dest.display(), "archived");
                        outcome.state = FileState::Archived;
                        summary.archived += 1;
                    }
                    Err(e) => warn!(file = %path.display(), error = %e, "archive failed"),
                }
            }
            self.outcomes.push(outcome);
        }

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            already_processed = summary.already_processed,
            records = summary.records_upserted,
            "ingestion run finished"
        );
        Ok(summary)
    }

    /// Classifies, parses and persists one file, then writes its ledger entry.
    ///
    /// Document-level problems end up in the returned outcome (and the
    /// ledger); only a failed ledger write is returned as an error.
    pub fn process_file(&mut self, path: &Path) -> StoreResult<FileOutcome> {
        let key = ledger_key(path);
        let span = info_span!("file", path = %key);
        let _enter = span.enter();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.clone());
        let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or_default();

        let classification = classify(path);
        let mut outcome = FileOutcome {
            path: path.to_path_buf(),
            ledger_key: key,
            kind: classification.kind,
            state: FileState::Discovered,
            status: LedgerStatus::Success,
            records: 0,
            row_failures: 0,
            message: None,
        };

        let parsed = match (classification.kind, &classification.product) {
            (DocumentKind::Unrecognized, _) => Err((
                FileState::ClassificationFailed,
                "file name matches no known report".to_string(),
            )),
            (DocumentKind::Inventory, None) => Err((
                FileState::ClassificationFailed,
                "inventory file name does not name a product".to_string(),
            )),
            (DocumentKind::Inventory, Some(product)) => {
                outcome.state = FileState::Classified;
                self.inventory
                    .parse_path(path, product)
                    .map(|p| Parsed::Inventory(p.records))
                    .map_err(parse_failure)
            }
            (DocumentKind::Delivery, _) => {
                outcome.state = FileState::Classified;
                self.delivery
                    .parse_path(path, classification.report_type)
                    .map(|p| Parsed::Delivery(p.records))
                    .map_err(parse_failure)
            }
        };

        match parsed {
            Err((state, message)) => {
                outcome.state = state;
                outcome.message = Some(message);
            }
            Ok(parsed) => {
                outcome.state = FileState::Parsed;
                let (total, report) = match &parsed {
                    Parsed::Inventory(records) => {
                        (records.len(), self.repo.upsert_inventory(records))
                    }
                    Parsed::Delivery(records) => (records.len(), self.repo.upsert_delivery(records)),
                };
                if total == 0 {
                    warn!("document yielded no records");
                }
                apply_report(&mut outcome, total, &report);
            }
        }
        outcome.status = outcome.state.ledger_status();

        self.repo.record_outcome(&LedgerEntry {
            file_path: outcome.ledger_key.clone(),
            file_name,
            file_kind: outcome.kind,
            file_size,
            processed_at: Utc::now(),
            status: outcome.status,
            records_inserted: outcome.records,
            error_message: outcome.message.clone(),
        })?;
        if outcome.status == LedgerStatus::Success {
            outcome.state = FileState::Logged;
        }

        match outcome.status {
            LedgerStatus::Success => info!(
                kind = outcome.kind.as_str(),
                records = outcome.records,
                row_failures = outcome.row_failures,
                "file ingested"
            ),
            LedgerStatus::Skipped => info!(
                reason = outcome.message.as_deref().unwrap_or_default(),
                "file skipped"
            ),
            LedgerStatus::Failed => error!(
                state = ?outcome.state,
                error = outcome.message.as_deref().unwrap_or_default(),
                "file failed"
            ),
        }
        Ok(outcome)
    }
}

fn parse_failure(e: ParseError) -> (FileState, String) {
    if e.is_unsupported_layout() {
        (FileState::Skipped, e.to_string())
    } else {
        (FileState::ParseFailed, format!("{:#}", anyhow::Error::new(e)))
    }
}

fn apply_report(outcome: &mut FileOutcome, total: usize, report: &UpsertReport) {
    outcome.records = report.applied as u64;
    outcome.row_failures = report.failures.len();
    if report.all_failed() {
        outcome.state = FileState::PersistFailed;
        let first = report
            .failures
            .first()
            .map(|f| f.error.as_str())
            .unwrap_or_default();
        outcome.message = Some(format!("all {total} rows failed to persist: {first}"));
    } else {
        outcome.state = FileState::Persisted;
        if !report.failures.is_empty() {
            outcome.message = Some(format!(
                "{} of {total} rows failed to persist",
                report.failures.len()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RowFailure;

    fn outcome() -> FileOutcome {
        FileOutcome {
            path: PathBuf::from("f.csv"),
            ledger_key: "/f.csv".into(),
            kind: DocumentKind::Inventory,
            state: FileState::Parsed,
            status: LedgerStatus::Success,
            records: 0,
            row_failures: 0,
            message: None,
        }
    }

    fn failure(i: usize) -> RowFailure {
        RowFailure {
            index: i,
            key: format!("row {i}"),
            error: "constraint failed".into(),
        }
    }

    #[test]
    fn partial_row_failures_stay_successful() {
        let mut o = outcome();
        let report = UpsertReport {
            applied: 3,
            failures: vec![failure(1)],
        };
        apply_report(&mut o, 4, &report);
        assert_eq!(o.state, FileState::Persisted);
        assert_eq!(o.state.ledger_status(), LedgerStatus::Success);
        assert_eq!(o.records, 3);
        assert_eq!(o.message.as_deref(), Some("1 of 4 rows failed to persist"));
    }

    #[test]
    fn all_rows_failing_is_a_persist_failure() {
        let mut o = outcome();
        let report = UpsertReport {
            applied: 0,
            failures: vec![failure(0), failure(1)],
        };
        apply_report(&mut o, 2, &report);
        assert_eq!(o.state, FileState::PersistFailed);
        assert_eq!(o.state.ledger_status(), LedgerStatus::Failed);
        assert_eq!(
            o.message.as_deref(),
            Some("all 2 rows failed to persist: constraint failed")
        );
    }

    #[test]
    fn unsupported_layout_maps_to_skipped() {
        let (state, msg) = parse_failure(ParseError::UnsupportedLayout("year-to-date".into()));
        assert_eq!(state, FileState::Skipped);
        assert!(msg.contains("year-to-date"));
        let (state, _) = parse_failure(ParseError::NoRecords);
        assert_eq!(state, FileState::ParseFailed);
    }

    #[test]
    fn io_failures_keep_their_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let (_, msg) = parse_failure(ParseError::Io(io));
        assert_eq!(msg, "I/O error: gone");
    }

    #[test]
    fn scan_is_sorted_flat_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_gold_stocks.xls", "a_notice.pdf", "notes.md", "c.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/d_silver_stocks.csv"), b"x").unwrap();

        let names: Vec<String> = scan_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a_notice.pdf", "b_gold_stocks.xls", "c.txt"]);
    }

    #[test]
    fn missing_input_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_files(&dir.path().join("absent")).is_err());
    }
}
