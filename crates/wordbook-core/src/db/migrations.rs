//! Database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get::<_, i32>(0).map(|v| v != 0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Migration to version 1: Initial schema
fn migrate_v1(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        // AUTOINCREMENT keeps deleted ids from being reused.
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );
        CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word TEXT NOT NULL,
            description TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_entries_word ON entries(word);
        CREATE INDEX IF NOT EXISTS idx_entries_updated ON entries(updated_at DESC);
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        INSERT INTO schema_version (version) VALUES (1);",
    )?;

    tx.commit()?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: Cloud sync metadata
///
/// `remote_id` mirrors the server-assigned row id after the first
/// successful push; NULL means never synced. At most one local entry may
/// be linked to a given cloud row.
fn migrate_v2(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE entries ADD COLUMN remote_id INTEGER;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_remote
            ON entries(remote_id) WHERE remote_id IS NOT NULL;
        INSERT INTO schema_version (version) VALUES (2);",
    )?;

    tx.commit()?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations() {
        let conn = setup();
        run(&conn).unwrap();

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = setup();
        run(&conn).unwrap();
        run(&conn).unwrap(); // Should not fail

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migration_v2_adds_remote_id() {
        let conn = setup();
        run(&conn).unwrap();

        conn.execute(
            "INSERT INTO entries (word, description, updated_at, remote_id) VALUES ('a', 'b', 1, 42)",
            [],
        )
        .unwrap();

        let remote_id: i64 = conn
            .query_row("SELECT remote_id FROM entries WHERE word = 'a'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(remote_id, 42);
    }

    #[test]
    fn test_remote_id_links_are_unique() {
        let conn = setup();
        run(&conn).unwrap();

        conn.execute(
            "INSERT INTO entries (word, description, updated_at, remote_id) VALUES ('a', 'b', 1, 42)",
            [],
        )
        .unwrap();

        let duplicate = conn.execute(
            "INSERT INTO entries (word, description, updated_at, remote_id) VALUES ('c', 'd', 2, 42)",
            [],
        );
        assert!(duplicate.is_err());

        // Unlinked rows are unconstrained
        conn.execute(
            "INSERT INTO entries (word, description, updated_at) VALUES ('c', 'd', 2)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO entries (word, description, updated_at) VALUES ('e', 'f', 3)",
            [],
        )
        .unwrap();
    }
}
