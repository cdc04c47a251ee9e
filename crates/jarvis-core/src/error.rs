use thiserror::Error;

/// Cross-cutting error taxonomy shared by every component (§7).
///
/// Components that need extra variants define their own enum and convert
/// into this one at their public boundary, so the HTTP/CLI adapters only
/// ever match on this enum.
#[derive(Debug, Error)]
pub enum JarvisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("credentials required for {provider}")]
    AuthRequired { provider: String },

    #[error("transient backend failure: {0}")]
    TransientBackend(#[from] anyhow::Error),

    #[error("{component} degraded: {reason}")]
    Degraded { component: String, reason: String },

    #[error("corrupt payload: {0}")]
    Corrupt(String),

    #[error("fatal invariant violation: {0}")]
    Fatal(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JarvisError {
    /// Short, stable code for logs and HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            JarvisError::InvalidInput(_) => "INVALID_INPUT",
            JarvisError::NotFound { .. } => "NOT_FOUND",
            JarvisError::AuthRequired { .. } => "AUTH_REQUIRED",
            JarvisError::TransientBackend(_) => "TRANSIENT_BACKEND",
            JarvisError::Degraded { .. } => "DEGRADED",
            JarvisError::Corrupt(_) => "CORRUPT",
            JarvisError::Fatal(_) => "FATAL",
            JarvisError::Database(_) => "DATABASE_ERROR",
            JarvisError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether a caller may retry this exact operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JarvisError::TransientBackend(_))
    }

    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        JarvisError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn degraded(component: impl Into<String>, reason: impl Into<String>) -> Self {
        JarvisError::Degraded {
            component: component.into(),
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for JarvisError {
    fn from(e: rusqlite::Error) -> Self {
        JarvisError::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JarvisError>;
