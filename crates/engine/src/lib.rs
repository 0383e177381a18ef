pub mod config;
pub mod error;

pub use config::{ConfigError, DatabaseLocation, StoreConfig};
pub use error::EngineError;
pub use pagestore_storage::SaveOutcome;

use tracing::{debug, info};

use pagestore_core::{clock, PageData, PageId, PagePath, PageRecord, PageSummary};
use pagestore_storage::{PageStorage, SqliteStorage};

/// Page content store: point reads and upserts of editor documents keyed by
/// page path.
///
/// The store owns its storage client. Callers construct it once at startup
/// and drop it at shutdown.
pub struct PageStore<S = SqliteStorage> {
    storage: S,
}

impl PageStore<SqliteStorage> {
    pub fn open(config: &StoreConfig) -> Result<Self, EngineError> {
        let storage = match config.location()? {
            DatabaseLocation::File(path) => {
                SqliteStorage::open_with_busy_timeout(&path, config.busy_timeout())?
            }
            DatabaseLocation::InMemory => SqliteStorage::open_in_memory()?,
        };
        Ok(Self::new(storage))
    }

    pub fn open_in_memory() -> Result<Self, EngineError> {
        Ok(Self::new(SqliteStorage::open_in_memory()?))
    }
}

impl<S: PageStorage> PageStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Returns the page stored for `path`, or `None` if it was never saved.
    pub fn get_page(&self, path: &str) -> Result<Option<PageRecord>, EngineError> {
        let path = PagePath::new(path)?;
        let page = self.storage.get_page(&path)?;
        debug!(%path, found = page.is_some(), "get_page");
        Ok(page)
    }

    /// Creates the page for `path` or replaces its data, returning the page id.
    pub fn save_page(&mut self, path: &str, data: &PageData) -> Result<PageId, EngineError> {
        Ok(self.save_page_detailed(path, data)?.id)
    }

    /// Like [`save_page`](Self::save_page), also reporting which branch ran.
    pub fn save_page_detailed(
        &mut self,
        path: &str,
        data: &PageData,
    ) -> Result<SaveOutcome, EngineError> {
        let path = PagePath::new(path)?;
        let now_ms = clock::physical_now()?;
        let outcome = self.storage.upsert_page(&path, data, now_ms)?;
        if outcome.created {
            info!(%path, id = %outcome.id, "created page");
        } else {
            debug!(%path, id = %outcome.id, revision = outcome.revision, "updated page");
        }
        Ok(outcome)
    }

    /// Removes the page for `path`. Returns false if there was none.
    pub fn delete_page(&mut self, path: &str) -> Result<bool, EngineError> {
        let path = PagePath::new(path)?;
        let removed = self.storage.delete_page(&path)?;
        if removed {
            info!(%path, "deleted page");
        }
        Ok(removed)
    }

    pub fn list_pages(&self) -> Result<Vec<PageSummary>, EngineError> {
        Ok(self.storage.list_pages()?)
    }

    pub fn page_count(&self) -> Result<u64, EngineError> {
        Ok(self.storage.page_count()?)
    }

    pub fn records_for_path(&self, path: &str) -> Result<u64, EngineError> {
        let path = PagePath::new(path)?;
        Ok(self.storage.records_for_path(&path)?)
    }
}
