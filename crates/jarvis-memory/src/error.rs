use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("vector store error: {0}")]
    VectorStore(#[from] anyhow::Error),

    #[error("chunk not found: {id}")]
    NotFound { id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported import format: {0}")]
    UnsupportedImport(String),

    #[error("invalid source id: {0}")]
    InvalidSourceId(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
