//! Data models for Wordbook

mod entry;

pub use entry::{Entry, EntryId, RemoteEntry, RemoteId};
