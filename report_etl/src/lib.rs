//! Ingestion pipeline for exchange report files.
//!
//! Files in an input directory are classified, parsed with
//! [`report_parsers`], merged into SQLite under their natural keys and logged
//! in a per-file processing ledger so re-runs only touch new or failed files.
//!
//! - [`etl`]: the run itself ([`etl::Etl`]) and archiving.
//! - [`store`]: the idempotent store and ledger ([`store::IngestionStore`]).
//! - [`db`], [`schema`], [`models`]: diesel plumbing.
//! - [`config`], [`logging`]: process setup used by the `report-etl` binary.

#![warn(missing_docs)]

pub mod config;
pub mod db;
pub mod etl;
pub mod logging;
pub mod models;
pub mod schema;
pub mod store;
