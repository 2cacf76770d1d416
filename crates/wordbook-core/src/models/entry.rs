//! Vocabulary entry model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// A local entry identifier, assigned by the on-device store on creation.
///
/// Ids are monotonically increasing and never reused, even after the row
/// they named is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

impl EntryId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw integer value of this ID
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for EntryId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A server-assigned row identifier in the cloud store.
///
/// Present on an [`Entry`] only after at least one successful push; its
/// absence means the entry has never been synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(i64);

impl RemoteId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A word/description pair in the notebook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Local identifier, stable for the record's lifetime
    pub id: EntryId,
    /// Cloud row this entry is linked to, if it has ever been pushed
    pub remote_id: Option<RemoteId>,
    /// The word or phrase being recorded
    pub word: String,
    /// Free-text meaning, translation or usage notes
    pub description: String,
    /// Last local or merged-in modification (Unix ms)
    pub updated_at: i64,
}

impl Entry {
    /// Whether this entry is linked to a cloud row
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Get the description truncated to `max_len` characters, first line only
    #[must_use]
    pub fn description_preview(&self, max_len: usize) -> String {
        self.description
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

/// A row in the cloud-side `words` table, as listed under one owner scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Server-assigned row identifier
    pub id: RemoteId,
    /// Scope key the row belongs to (`user:<id>` or `device:<id>`)
    pub owner: String,
    pub word: String,
    pub description: String,
    /// Last modification as recorded remotely (Unix ms)
    pub updated_at: i64,
}
