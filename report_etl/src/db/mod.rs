//! Database utilities for connections and schema migrations.
//!
//! - [`connection::connect_sqlite`] opens a connection with WAL journaling,
//!   `foreign_keys=ON` and a busy timeout; [`connection::connect_sqlite_with`]
//!   additionally takes the single-writer lock.
//! - [`migrate::run_pending`] applies the embedded migrations on an open
//!   connection; [`migrate::run_sqlite`] does the same for a path.
//!
//! ```no_run
//! use report_etl::db::{connection, migrate};
//!
//! let db_path = std::env::temp_dir().join("report_etl_example.db");
//! migrate::run_sqlite(db_path.to_str().unwrap()).expect("migrations");
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
