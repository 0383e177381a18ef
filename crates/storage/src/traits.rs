use pagestore_core::{PageData, PageId, PagePath, PageRecord, PageSummary};

use crate::error::StorageError;

/// Result of an upsert: the affected record's id, its revision after the
/// write, and whether the write created the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub id: PageId,
    pub revision: u64,
    pub created: bool,
}

pub trait PageStorage {
    /// Point lookup by path. `None` when no page exists for `path`.
    fn get_page(&self, path: &PagePath) -> Result<Option<PageRecord>, StorageError>;

    /// Inserts a page for `path` or replaces the `data` of the existing one.
    /// `id`, `path` and `created_at` of an existing page are left untouched.
    fn upsert_page(
        &mut self,
        path: &PagePath,
        data: &PageData,
        now_ms: u64,
    ) -> Result<SaveOutcome, StorageError>;

    fn delete_page(&mut self, path: &PagePath) -> Result<bool, StorageError>;

    fn list_pages(&self) -> Result<Vec<PageSummary>, StorageError>;

    fn page_count(&self) -> Result<u64, StorageError>;

    /// Number of stored rows carrying `path`. Always 0 or 1 for a healthy store.
    fn records_for_path(&self, path: &PagePath) -> Result<u64, StorageError>;
}
