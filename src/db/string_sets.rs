use std::collections::BTreeSet;

use rusqlite::{params, Connection};

use crate::storage::StorageError;

/// Fetch every value stored under `key`. A key that was never written reads
/// as an empty set.
pub fn get_string_set(conn: &Connection, key: &str) -> Result<BTreeSet<String>, StorageError> {
    let mut stmt =
        conn.prepare("SELECT value FROM string_sets WHERE set_key = ?1 ORDER BY value")?;

    let values = stmt
        .query_map([key], |row| row.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(values)
}

/// Replace the whole set stored under `key`. The delete and the inserts share
/// one transaction, so a concurrent reader sees either the old set or the new
/// one and never a mix.
pub fn put_string_set<I, S>(conn: &mut Connection, key: &str, values: I) -> Result<(), StorageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM string_sets WHERE set_key = ?1", [key])?;
    {
        let mut insert = tx.prepare(
            "INSERT OR IGNORE INTO string_sets (set_key, value) VALUES (?1, ?2)",
        )?;
        for value in values {
            insert.execute(params![key, value.as_ref()])?;
        }
    }
    tx.commit()?;
    Ok(())
}
