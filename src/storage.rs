//! The persistence port used by the controller. The controller only knows
//! `save`/`load`; the concrete adapters decide where the serialized records
//! end up.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::{get_string_set, open_in_memory_store, open_store, put_string_set};
use crate::models::Child;

/// Name of the string set that holds the serialized children.
pub const CHILDREN_KEY: &str = "CHILDREN";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create data directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open store at {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("store query failed")]
    Query(#[from] rusqlite::Error),
}

/// Persistence port for the child collection.
///
/// `save` must replace everything previously stored in one step: a `load`
/// after a `save` never observes a mix of the two lists. `load` on a fresh
/// store yields an empty list.
pub trait Storage {
    fn save(&mut self, children: &[Child]) -> Result<(), StorageError>;
    fn load(&self) -> Result<Vec<Child>, StorageError>;
}

/// Turn stored entries back into children, skipping anything that does not
/// parse so one corrupt entry cannot take the whole list down with it.
fn decode_entries<'a>(entries: impl IntoIterator<Item = &'a String>) -> Vec<Child> {
    entries
        .into_iter()
        .filter_map(|entry| match Child::from_serialized(entry) {
            Ok(child) => Some(child),
            Err(err) => {
                warn!(%err, "skipping malformed stored entry");
                None
            }
        })
        .collect()
}

/// Storage adapter backed by the SQLite string-set store.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::from_connection(open_store(path)?))
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self::from_connection(open_in_memory_store()?))
    }

    /// Wrap a connection whose schema has already been prepared.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Raw view of the persisted set, mostly useful to assert on the wire
    /// format.
    pub fn raw_entries(&self) -> Result<BTreeSet<String>, StorageError> {
        get_string_set(&self.conn, CHILDREN_KEY)
    }
}

impl Storage for SqliteStorage {
    fn save(&mut self, children: &[Child]) -> Result<(), StorageError> {
        put_string_set(
            &mut self.conn,
            CHILDREN_KEY,
            children.iter().map(Child::serialized),
        )?;
        debug!(count = children.len(), "saved children");
        Ok(())
    }

    fn load(&self) -> Result<Vec<Child>, StorageError> {
        let entries = get_string_set(&self.conn, CHILDREN_KEY)?;
        let children = decode_entries(&entries);
        debug!(
            stored = entries.len(),
            loaded = children.len(),
            "loaded children"
        );
        Ok(children)
    }
}

/// In-process storage that keeps the serialized entries in a set. It shares
/// the wire format with [`SqliteStorage`], so seeding it with raw strings
/// exercises the same decoding path.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeSet<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with already-serialized entries.
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn entries(&self) -> &BTreeSet<String> {
        &self.entries
    }
}

impl Storage for MemoryStorage {
    fn save(&mut self, children: &[Child]) -> Result<(), StorageError> {
        self.entries = children.iter().map(Child::serialized).collect();
        Ok(())
    }

    fn load(&self) -> Result<Vec<Child>, StorageError> {
        Ok(decode_entries(&self.entries))
    }
}
