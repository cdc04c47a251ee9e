use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("queue item not found: {id}")]
    NotFound { id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("upload failed: {0}")]
    Upload(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;
