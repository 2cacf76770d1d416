//! Settings repository implementation

use crate::error::Result;
use rusqlite::Connection;

const DEVICE_ID_KEY: &str = "device_id";
const SYNC_OWNER_KEY: &str = "sync_owner";
const LAST_SYNCED_AT_KEY: &str = "last_synced_at";

/// Trait for local settings storage
pub trait SettingsRepository {
    /// Per-installation device identifier, generated once and kept forever
    fn device_id(&self) -> Result<String>;

    /// Owner key (`user:<id>` or `device:<id>`) the stored remote ids belong to
    fn sync_owner(&self) -> Result<Option<String>>;

    /// Record which owner the stored remote ids belong to
    fn set_sync_owner(&self, owner: &str) -> Result<()>;

    /// Completion time of the last successful pull-merge (Unix ms)
    fn last_synced_at(&self) -> Result<Option<i64>>;

    /// Record the completion time of a pull-merge
    fn set_last_synced_at(&self, timestamp_ms: i64) -> Result<()>;
}

/// `SQLite` implementation of `SettingsRepository`
pub struct SqliteSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let result = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get(0)
            });

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            [key, value],
        )?;
        Ok(())
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn device_id(&self) -> Result<String> {
        if let Some(id) = self.get_setting(DEVICE_ID_KEY)? {
            return Ok(id);
        }

        let id = uuid::Uuid::now_v7().to_string();
        self.set_setting(DEVICE_ID_KEY, &id)?;
        tracing::info!("Generated device id for this installation");
        Ok(id)
    }

    fn sync_owner(&self) -> Result<Option<String>> {
        self.get_setting(SYNC_OWNER_KEY)
    }

    fn set_sync_owner(&self, owner: &str) -> Result<()> {
        self.set_setting(SYNC_OWNER_KEY, owner)
    }

    fn last_synced_at(&self) -> Result<Option<i64>> {
        Ok(self
            .get_setting(LAST_SYNCED_AT_KEY)?
            .and_then(|value| value.parse().ok()))
    }

    fn set_last_synced_at(&self, timestamp_ms: i64) -> Result<()> {
        self.set_setting(LAST_SYNCED_AT_KEY, &timestamp_ms.to_string())
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

    #[test]
    fn test_device_id_is_stable() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());

        let first = repo.device_id().unwrap();
        let second = repo.device_id().unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_sync_owner_roundtrip() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());

        assert_eq!(repo.sync_owner().unwrap(), None);

        repo.set_sync_owner("user:abc").unwrap();
        assert_eq!(repo.sync_owner().unwrap(), Some("user:abc".to_string()));

        repo.set_sync_owner("device:xyz").unwrap();
        assert_eq!(repo.sync_owner().unwrap(), Some("device:xyz".to_string()));
    }

    #[test]
    fn test_last_synced_at_roundtrip() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());

        assert_eq!(repo.last_synced_at().unwrap(), None);

        repo.set_last_synced_at(1_700_000_000_000).unwrap();
        assert_eq!(repo.last_synced_at().unwrap(), Some(1_700_000_000_000));
    }
}
