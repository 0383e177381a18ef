use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid page path: {0}")]
    InvalidPath(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid data: {0}")]
    InvalidData(String),
}
