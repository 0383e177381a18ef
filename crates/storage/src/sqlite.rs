use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use pagestore_core::{CoreError, EncodedData, PageData, PageId, PagePath, PageRecord, PageSummary};

use crate::error::StorageError;
use crate::schema::{self, DEFAULT_BUSY_TIMEOUT};
use crate::traits::{PageStorage, SaveOutcome};

/// Convert Vec<u8> to fixed-size array with proper error handling.
fn to_array<const N: usize>(v: Vec<u8>, label: &str) -> Result<[u8; N], StorageError> {
    v.try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {label} length")))
}

const SELECT_PAGE: &str = "SELECT id, path, data, checksum, revision, created_at, updated_at FROM puck_pages WHERE path = ?1";

const UPSERT_PAGE: &str = "INSERT INTO puck_pages (id, path, data, checksum, revision, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
     ON CONFLICT(path) DO UPDATE SET data = excluded.data, checksum = excluded.checksum, revision = puck_pages.revision + 1, updated_at = excluded.updated_at
     RETURNING id, revision";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with_busy_timeout(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        schema::init_schema(&conn, busy_timeout)?;
        info!(path = %path.display(), "opened page database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn, DEFAULT_BUSY_TIMEOUT)?;
        debug!("opened in-memory page database");
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

type PageRow = (Vec<u8>, String, Vec<u8>, Vec<u8>, i64, i64, i64);

fn read_page_row(row: &rusqlite::Row) -> rusqlite::Result<PageRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn page_from_row(row: PageRow) -> Result<PageRecord, StorageError> {
    let (id_bytes, path, data_bytes, checksum_bytes, revision, created_at, updated_at) = row;
    let id = PageId::from_bytes(to_array::<16>(id_bytes, "id")?);
    let encoded = EncodedData {
        bytes: data_bytes,
        checksum: to_array::<32>(checksum_bytes, "checksum")?,
    };
    let data = match encoded.decode() {
        Ok(data) => data,
        Err(CoreError::ChecksumMismatch) => {
            warn!(%path, %id, "stored page data failed checksum verification");
            return Err(StorageError::ChecksumMismatch { path });
        }
        Err(e) => return Err(e.into()),
    };
    Ok(PageRecord {
        id,
        path: PagePath::new(path)?,
        data,
        revision: revision as u64,
        created_at_ms: created_at as u64,
        updated_at_ms: updated_at as u64,
    })
}

impl PageStorage for SqliteStorage {
    fn get_page(&self, path: &PagePath) -> Result<Option<PageRecord>, StorageError> {
        let mut stmt = self.conn.prepare_cached(SELECT_PAGE)?;
        let mut rows = stmt.query_map(rusqlite::params![path.as_str()], read_page_row)?;

        let first = match rows.next() {
            Some(row) => row?,
            None => return Ok(None),
        };
        if rows.next().is_some() {
            return Err(StorageError::ConstraintViolation(format!(
                "more than one page stored for path {path}"
            )));
        }
        page_from_row(first).map(Some)
    }

    fn upsert_page(
        &mut self,
        path: &PagePath,
        data: &PageData,
        now_ms: u64,
    ) -> Result<SaveOutcome, StorageError> {
        let encoded = EncodedData::encode(data)?;
        let candidate = PageId::new();

        let (id_bytes, revision): (Vec<u8>, i64) = self.conn.query_row(
            UPSERT_PAGE,
            rusqlite::params![
                candidate.as_bytes().as_slice(),
                path.as_str(),
                encoded.bytes,
                &encoded.checksum[..],
                now_ms as i64,
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let id = PageId::from_bytes(to_array::<16>(id_bytes, "id")?);
        let created = revision == 1;
        debug!(%path, %id, revision, created, "upserted page");
        Ok(SaveOutcome {
            id,
            revision: revision as u64,
            created,
        })
    }

    fn delete_page(&mut self, path: &PagePath) -> Result<bool, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM puck_pages WHERE path = ?1",
            rusqlite::params![path.as_str()],
        )?;
        debug!(%path, removed, "deleted page");
        Ok(removed > 0)
    }

    fn list_pages(&self) -> Result<Vec<PageSummary>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path, revision, updated_at FROM puck_pages ORDER BY path")?;
        let rows = stmt.query_map([], |row| {
            let id_bytes: Vec<u8> = row.get(0)?;
            let path: String = row.get(1)?;
            let revision: i64 = row.get(2)?;
            let updated_at: i64 = row.get(3)?;
            Ok((id_bytes, path, revision, updated_at))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id_bytes, path, revision, updated_at) = row?;
            result.push(PageSummary {
                id: PageId::from_bytes(to_array::<16>(id_bytes, "id")?),
                path: PagePath::new(path)?,
                revision: revision as u64,
                updated_at_ms: updated_at as u64,
            });
        }
        Ok(result)
    }

    fn page_count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM puck_pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn records_for_path(&self, path: &PagePath) -> Result<u64, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM puck_pages WHERE path = ?1",
            rusqlite::params![path.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
