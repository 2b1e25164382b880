//! SQLite connection helpers.

use diesel::connection::SimpleConnection;
use diesel::{Connection, SqliteConnection};

/// Default `busy_timeout` in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;

/// Connection-wide settings applied right after `establish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// How long to wait on a locked database before failing.
    pub busy_timeout_ms: u32,
    /// Hold the file lock for the lifetime of the connection
    /// (`locking_mode=EXCLUSIVE`).
    pub exclusive: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            exclusive: false,
        }
    }
}

/// Open a SQLite connection with WAL, foreign keys and the default busy timeout.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    connect_sqlite_with(database_url, ConnectOptions::default())
}

/// Open a SQLite connection and apply connection-wide PRAGMAs.
///
/// The busy timeout goes first so that the remaining PRAGMAs already wait on
/// a locked file instead of failing immediately.
pub fn connect_sqlite_with(
    database_url: &str,
    options: ConnectOptions,
) -> anyhow::Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)?;

    conn.batch_execute(&format!("PRAGMA busy_timeout={};", options.busy_timeout_ms))?;
    if options.exclusive {
        conn.batch_execute("PRAGMA locking_mode=EXCLUSIVE;")?;
    }
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    conn.batch_execute("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}
