use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("checksum mismatch for page {path}")]
    ChecksumMismatch { path: String },

    #[error("core error: {0}")]
    Core(#[from] pagestore_core::CoreError),
}
