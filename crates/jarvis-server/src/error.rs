//! HTTP error mapping (§7): every handler returns `Result<T, ApiError>`, and
//! `ApiError`'s `IntoResponse` impl is the single place that turns the
//! cross-cutting [`jarvis_core::JarvisError`] taxonomy (plus each crate's
//! own error enum) into a status code and JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] jarvis_core::JarvisError),
    #[error(transparent)]
    Memory(#[from] jarvis_memory::MemoryError),
    #[error(transparent)]
    Enrich(#[from] jarvis_enrich::EnrichError),
    #[error(transparent)]
    Briefing(#[from] jarvis_briefing::BriefingError),
    #[error(transparent)]
    Scheduler(#[from] jarvis_scheduler::SchedulerError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Core(e) => (core_status(e), e.code(), e.to_string()),
            ApiError::Memory(e) => (StatusCode::INTERNAL_SERVER_ERROR, "MEMORY_ERROR", e.to_string()),
            ApiError::Enrich(e) => (StatusCode::INTERNAL_SERVER_ERROR, "ENRICH_ERROR", e.to_string()),
            ApiError::Briefing(e) => (StatusCode::INTERNAL_SERVER_ERROR, "BRIEFING_ERROR", e.to_string()),
            ApiError::Scheduler(e) => (StatusCode::INTERNAL_SERVER_ERROR, "SCHEDULER_ERROR", e.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            ApiError::NotFound { kind, id } => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", format!("{kind} not found: {id}"))
            }
        };
        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

fn core_status(e: &jarvis_core::JarvisError) -> StatusCode {
    match e {
        jarvis_core::JarvisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        jarvis_core::JarvisError::NotFound { .. } => StatusCode::NOT_FOUND,
        jarvis_core::JarvisError::AuthRequired { .. } => StatusCode::UNAUTHORIZED,
        jarvis_core::JarvisError::Degraded { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
