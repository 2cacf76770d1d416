//! Entry repository implementation

use crate::error::{Result, StorageError};
use crate::models::{Entry, EntryId, RemoteEntry, RemoteId};
use crate::util::unix_timestamp_ms;
use rusqlite::{params, Connection};

/// Trait for entry storage operations
///
/// The user-path writes (`create`/`update`/`delete`) stamp `updated_at`
/// with the current time. The sync-path writes below them are reserved for
/// the reconciler and preserve remote timestamps instead.
pub trait EntryRepository {
    /// Create a new entry; `word` and `description` must be non-empty after trimming
    fn create(&self, word: &str, description: &str) -> Result<Entry>;

    /// Get an entry by ID
    fn get(&self, id: EntryId) -> Result<Option<Entry>>;

    /// List all entries, newest first
    fn get_all(&self) -> Result<Vec<Entry>>;

    /// Update an entry's word and description
    fn update(&self, id: EntryId, word: &str, description: &str) -> Result<Entry>;

    /// Delete an entry; deleting an unknown id is a no-op success
    fn delete(&self, id: EntryId) -> Result<()>;

    /// Link an entry to its cloud row without touching `updated_at`
    fn bind_remote_id(&self, id: EntryId, remote_id: RemoteId) -> Result<()>;

    /// Insert a remote row as a new local entry, keeping its remote timestamp
    fn insert_pulled(&self, row: &RemoteEntry) -> Result<Entry>;

    /// Replace an entry's content with a remote row's, keeping its remote timestamp
    fn overwrite_from_remote(&self, id: EntryId, row: &RemoteEntry) -> Result<()>;

    /// Detach every entry from its cloud row; returns how many were linked
    fn clear_remote_ids(&self) -> Result<usize>;

    /// Count entries that have never been pushed
    fn count_unsynced(&self) -> Result<usize>;
}

/// `SQLite` implementation of `EntryRepository`
pub struct SqliteEntryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteEntryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse an entry from a database row
    fn parse_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
        Ok(Entry {
            id: EntryId::new(row.get(0)?),
            remote_id: row.get::<_, Option<i64>>(1)?.map(RemoteId::new),
            word: row.get(2)?,
            description: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

/// Trim a required text field, rejecting empty values
fn normalize_required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StorageError::InvalidInput(format!(
            "{field} must not be empty"
        )));
    }
    Ok(value.to_string())
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create(&self, word: &str, description: &str) -> Result<Entry> {
        let word = normalize_required(word, "word")?;
        let description = normalize_required(description, "description")?;
        let now = unix_timestamp_ms();

        self.conn.execute(
            "INSERT INTO entries (word, description, updated_at) VALUES (?, ?, ?)",
            params![word, description, now],
        )?;

        Ok(Entry {
            id: EntryId::new(self.conn.last_insert_rowid()),
            remote_id: None,
            word,
            description,
            updated_at: now,
        })
    }

    fn get(&self, id: EntryId) -> Result<Option<Entry>> {
        let result = self.conn.query_row(
            "SELECT id, remote_id, word, description, updated_at FROM entries WHERE id = ?",
            params![id.as_i64()],
            Self::parse_entry,
        );

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all(&self) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, remote_id, word, description, updated_at
             FROM entries
             ORDER BY updated_at DESC, id DESC",
        )?;

        let entries = stmt
            .query_map([], Self::parse_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }

    fn update(&self, id: EntryId, word: &str, description: &str) -> Result<Entry> {
        let word = normalize_required(word, "word")?;
        let description = normalize_required(description, "description")?;
        let now = unix_timestamp_ms();

        let rows = self.conn.execute(
            "UPDATE entries SET word = ?, description = ?, updated_at = ? WHERE id = ?",
            params![word, description, now, id.as_i64()],
        )?;

        if rows == 0 {
            return Err(StorageError::NotFound(id.as_i64()));
        }

        self.get(id)?.ok_or(StorageError::NotFound(id.as_i64()))
    }

    fn delete(&self, id: EntryId) -> Result<()> {
        // Zero affected rows is fine: deleting twice must succeed.
        self.conn
            .execute("DELETE FROM entries WHERE id = ?", params![id.as_i64()])?;
        Ok(())
    }

    fn bind_remote_id(&self, id: EntryId, remote_id: RemoteId) -> Result<()> {
        // Zero affected rows means the entry was deleted while its push was
        // in flight; there is nothing left to link.
        self.conn.execute(
            "UPDATE entries SET remote_id = ? WHERE id = ?",
            params![remote_id.as_i64(), id.as_i64()],
        )?;
        Ok(())
    }

    fn insert_pulled(&self, row: &RemoteEntry) -> Result<Entry> {
        self.conn.execute(
            "INSERT INTO entries (remote_id, word, description, updated_at) VALUES (?, ?, ?, ?)",
            params![row.id.as_i64(), row.word, row.description, row.updated_at],
        )?;

        Ok(Entry {
            id: EntryId::new(self.conn.last_insert_rowid()),
            remote_id: Some(row.id),
            word: row.word.clone(),
            description: row.description.clone(),
            updated_at: row.updated_at,
        })
    }

    fn overwrite_from_remote(&self, id: EntryId, row: &RemoteEntry) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE entries SET word = ?, description = ?, updated_at = ? WHERE id = ?",
            params![row.word, row.description, row.updated_at, id.as_i64()],
        )?;

        if rows == 0 {
            return Err(StorageError::NotFound(id.as_i64()));
        }

        Ok(())
    }

    fn clear_remote_ids(&self) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE entries SET remote_id = NULL WHERE remote_id IS NOT NULL",
            [],
        )?;
        Ok(rows)
    }

    fn count_unsynced(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE remote_id IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn remote_row(id: i64, word: &str, description: &str, updated_at: i64) -> RemoteEntry {
        RemoteEntry {
            id: RemoteId::new(id),
            owner: "device:test".to_string(),
            word: word.to_string(),
            description: description.to_string(),
            updated_at,
        }
    }

    #[test]
    fn test_create_and_get() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let entry = repo.create("serendipity", "a happy accident").unwrap();
        assert_eq!(entry.word, "serendipity");
        assert_eq!(entry.remote_id, None);
        assert!(entry.updated_at > 0);

        let fetched = repo.get(entry.id).unwrap().unwrap();
        assert_eq!(fetched, entry);
    }

    #[test]
    fn test_create_trims_input() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let entry = repo.create("  hygge ", " cozy contentment  ").unwrap();
        assert_eq!(entry.word, "hygge");
        assert_eq!(entry.description, "cozy contentment");
    }

    #[test]
    fn test_create_rejects_blank_fields() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        assert!(matches!(
            repo.create("   ", "something"),
            Err(StorageError::InvalidInput(_))
        ));
        assert!(matches!(
            repo.create("word", ""),
            Err(StorageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        assert!(repo.get(EntryId::new(999)).unwrap().is_none());
    }

    #[test]
    fn test_get_all_newest_first() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let first = repo.create("uno", "one").unwrap();
        let second = repo.create("dos", "two").unwrap();
        let third = repo.create("tres", "three").unwrap();

        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 3);
        // Same-millisecond creations fall back to id order.
        assert_eq!(all[0].id, third.id);
        assert_eq!(all[1].id, second.id);
        assert_eq!(all[2].id, first.id);
    }

    #[test]
    fn test_update() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let entry = repo.create("cat", "feline").unwrap();
        let updated = repo.update(entry.id, "cat", "small feline").unwrap();

        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.description, "small feline");
        assert!(updated.updated_at >= entry.updated_at);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        assert!(matches!(
            repo.update(EntryId::new(7), "a", "b"),
            Err(StorageError::NotFound(7))
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let keep = repo.create("keep", "stays").unwrap();
        let gone = repo.create("gone", "leaves").unwrap();

        repo.delete(gone.id).unwrap();
        repo.delete(gone.id).unwrap();
        repo.delete(EntryId::new(12345)).unwrap();

        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, keep.id);
    }

    #[test]
    fn test_deleted_ids_are_not_reused() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let first = repo.create("first", "x").unwrap();
        repo.delete(first.id).unwrap();

        let second = repo.create("second", "y").unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_bind_remote_id_preserves_updated_at() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let entry = repo.create("fika", "coffee break").unwrap();
        repo.bind_remote_id(entry.id, RemoteId::new(42)).unwrap();

        let fetched = repo.get(entry.id).unwrap().unwrap();
        assert_eq!(fetched.remote_id, Some(RemoteId::new(42)));
        assert_eq!(fetched.updated_at, entry.updated_at);
    }

    #[test]
    fn test_bind_remote_id_after_delete_is_noop() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let entry = repo.create("fleeting", "short-lived").unwrap();
        repo.delete(entry.id).unwrap();

        repo.bind_remote_id(entry.id, RemoteId::new(9)).unwrap();
        assert!(repo.get(entry.id).unwrap().is_none());
    }

    #[test]
    fn test_insert_pulled_keeps_remote_fields() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let row = remote_row(7, "saudade", "longing", 1_600_000_000_000);
        let entry = repo.insert_pulled(&row).unwrap();

        assert_eq!(entry.remote_id, Some(RemoteId::new(7)));
        assert_eq!(entry.word, "saudade");
        assert_eq!(entry.updated_at, 1_600_000_000_000);

        let fetched = repo.get(entry.id).unwrap().unwrap();
        assert_eq!(fetched, entry);
    }

    #[test]
    fn test_overwrite_from_remote_keeps_remote_timestamp() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let entry = repo.create("wanderlust", "urge to travel").unwrap();
        let row = remote_row(3, "wanderlust", "desire to roam", entry.updated_at + 5_000);

        repo.overwrite_from_remote(entry.id, &row).unwrap();

        let fetched = repo.get(entry.id).unwrap().unwrap();
        assert_eq!(fetched.description, "desire to roam");
        assert_eq!(fetched.updated_at, entry.updated_at + 5_000);
    }

    #[test]
    fn test_clear_remote_ids() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let linked = repo.create("linked", "x").unwrap();
        repo.bind_remote_id(linked.id, RemoteId::new(1)).unwrap();
        repo.create("unlinked", "y").unwrap();

        assert_eq!(repo.clear_remote_ids().unwrap(), 1);
        assert!(repo.get(linked.id).unwrap().unwrap().remote_id.is_none());
    }

    #[test]
    fn test_count_unsynced() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let a = repo.create("a", "1").unwrap();
        repo.create("b", "2").unwrap();
        assert_eq!(repo.count_unsynced().unwrap(), 2);

        repo.bind_remote_id(a.id, RemoteId::new(10)).unwrap();
        assert_eq!(repo.count_unsynced().unwrap(), 1);
    }
}
