//! Versioned schema migrations, each applied in its own transaction and
//! tracked in a `schema_version` table.

use rusqlite::Connection;

use crate::errors::{Result, StoreError};

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "events, referrals, uploads, metrics, users tables",
    sql: include_str!("v001_schema.sql"),
}];

fn ensure_version_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;
    Ok(())
}

/// Apply every migration with a version greater than the current one, each
/// in its own transaction. Returns the schema version after applying.
pub fn run_migrations(conn: &mut Connection) -> Result<u32> {
    ensure_version_table(conn)?;
    let mut version = current_version(conn)?;
    for migration in MIGRATIONS {
        if migration.version > version {
            apply_migration(conn, migration)?;
            version = migration.version;
        }
    }
    Ok(version)
}

fn apply_migration(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(migration.sql).map_err(|e| StoreError::Migration {
        message: format!("v{:03} ({}): {e}", migration.version, migration.description),
    })?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [migration.version],
    )?;
    tx.commit()?;
    Ok(())
}

/// The highest applied migration version, or 0 if none has run.
pub fn current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT max(version) FROM schema_version", [], |row| row.get(0))
        .map_err(StoreError::Sqlite)?;
    Ok(version.unwrap_or(0))
}

/// The highest migration version known to this binary.
#[must_use]
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::connection::{new_in_memory, ConnectionConfig};

    #[test]
    fn migrations_are_idempotent() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let mut conn = pool.get().unwrap();
        let v1 = run_migrations(&mut conn).unwrap();
        let v2 = run_migrations(&mut conn).unwrap();
        assert_eq!(v1, v2);
        assert_eq!(v1, latest_version());
    }

    #[test]
    fn tables_exist_after_migrating() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let mut conn = pool.get().unwrap();
        run_migrations(&mut conn).unwrap();
        for table in ["events", "referrals", "uploads", "metrics", "users"] {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "missing table {table}");
        }
    }
}
