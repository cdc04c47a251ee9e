use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("vector store error: {0}")]
    VectorStore(#[from] anyhow::Error),
    #[error("memory error: {0}")]
    Memory(#[from] jarvis_memory::MemoryError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EnrichError>;
