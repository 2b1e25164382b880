//! Embedded schema migrations.

use anyhow::anyhow;
use diesel::{Connection, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Embedded Diesel migrations bundled with this crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies pending migrations on an open connection. Idempotent.
pub fn run_pending(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow!(e))?;
    if !applied.is_empty() {
        tracing::info!(count = applied.len(), "applied schema migrations");
    }
    Ok(())
}

/// Opens the database at `url` and applies pending migrations.
pub fn run_sqlite(url: &str) -> anyhow::Result<()> {
    let mut conn = SqliteConnection::establish(url)?;
    run_pending(&mut conn)
}
