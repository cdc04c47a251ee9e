use thiserror::Error;

#[derive(Debug, Error)]
pub enum BriefingError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("vector store error: {0}")]
    VectorStore(anyhow::Error),
    #[error("llm error: {0}")]
    Llm(anyhow::Error),
    #[error("memory error: {0}")]
    Memory(#[from] jarvis_memory::MemoryError),
    #[error("enrich error: {0}")]
    Enrich(#[from] jarvis_enrich::EnrichError),
    #[error(transparent)]
    Core(#[from] jarvis_core::JarvisError),
}

pub type Result<T> = std::result::Result<T, BriefingError>;
