use std::time::Duration;

use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub const PAGES_TABLE: &str = "puck_pages";
pub const PATH_INDEX: &str = "by_path";

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

pub fn init_schema(conn: &Connection, busy_timeout: Duration) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -8000;
    ",
    )?;
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, unixepoch())",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}

// `by_path` is UNIQUE so the upsert can target it with ON CONFLICT and a
// second record for the same path is rejected by SQLite itself.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS puck_pages (
    rowid INTEGER PRIMARY KEY,
    id BLOB NOT NULL UNIQUE CHECK (length(id) = 16),
    path TEXT NOT NULL CHECK (length(path) > 0),
    data BLOB NOT NULL,
    checksum BLOB NOT NULL CHECK (length(checksum) = 32),
    revision INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS by_path ON puck_pages (path);
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() -> Result<(), StorageError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn, DEFAULT_BUSY_TIMEOUT)?;
        init_schema(&conn, DEFAULT_BUSY_TIMEOUT)?;

        let version: i32 =
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
        assert_eq!(version, SCHEMA_VERSION);

        let rows: i64 = conn.query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))?;
        assert_eq!(rows, 1);
        Ok(())
    }

    #[test]
    fn path_index_is_unique() -> Result<(), StorageError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn, DEFAULT_BUSY_TIMEOUT)?;

        let unique: bool = conn.query_row(
            "SELECT \"unique\" FROM pragma_index_list(?1) WHERE name = ?2",
            rusqlite::params![PAGES_TABLE, PATH_INDEX],
            |row| row.get(0),
        )?;
        assert!(unique);
        Ok(())
    }

    #[test]
    fn empty_path_rejected_by_table() -> Result<(), StorageError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn, DEFAULT_BUSY_TIMEOUT)?;

        let result = conn.execute(
            "INSERT INTO puck_pages (id, path, data, checksum, created_at, updated_at) VALUES (zeroblob(16), '', x'c0', zeroblob(32), 0, 0)",
            [],
        );
        assert!(result.is_err());
        Ok(())
    }
}
