use std::fs;
use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use crate::storage::StorageError;

/// Open (creating if needed) the string-set database at `path` and run the
/// lazy migration.
pub fn open_store(path: &Path) -> Result<Connection, StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let conn = Connection::open(path).map_err(|source| StorageError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    ensure_schema(&conn)?;
    debug!(path = %path.display(), "opened string-set store");
    Ok(conn)
}

/// Volatile store used by tests and throwaway sessions.
pub fn open_in_memory_store() -> Result<Connection, StorageError> {
    let conn = Connection::open_in_memory()?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Every element of every set is its own row. The composite key gives the
/// table set semantics, so a repeated value collapses instead of duplicating.
fn ensure_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS string_sets (
            set_key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (set_key, value)
        )",
        [],
    )?;
    Ok(())
}
