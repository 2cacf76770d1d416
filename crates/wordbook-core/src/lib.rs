//! wordbook-core - Core library for Wordbook
//!
//! This crate contains the shared models, the local storage layer, and the
//! local/cloud reconciliation logic used by the Wordbook interfaces.

pub mod auth;
pub mod config;
pub mod db;
pub mod detect;
pub mod error;
pub mod models;
pub mod remote;
pub mod session;
pub mod sync;
pub mod util;

pub use error::{Result, StorageError};
pub use models::{Entry, EntryId, RemoteEntry, RemoteId};
