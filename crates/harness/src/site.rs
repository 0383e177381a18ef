use std::path::{Path, PathBuf};

use pagestore_engine::{EngineError, PageStore, StoreConfig};
use tempfile::TempDir;

/// An on-disk page database in a temporary directory. Every call to
/// [`TestSite::connect`] opens an independent connection to the same file,
/// the way separate request handlers would.
pub struct TestSite {
    _dir: TempDir,
    db_path: PathBuf,
}

impl TestSite {
    pub fn new() -> Result<Self, std::io::Error> {
        let dir = tempfile::tempdir()?;
        let db_path = dir.path().join("pages.db");
        Ok(Self { _dir: dir, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig::with_database(self.db_path.to_string_lossy())
    }

    pub fn connect(&self) -> Result<PageStore, EngineError> {
        PageStore::open(&self.config())
    }
}
