//! POST /conversations — import a ChatGPT/Claude/Grok export (§4.3 Supplemented).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::body::Bytes;
use axum::Json;
use jarvis_core::types::CaptureStatus;
use serde::{Deserialize, Serialize};

use jarvis_memory::import::{chatgpt, claude, grok, ParsedConversation};
use jarvis_memory::store::NormalizedConversation;

use crate::app::AppState;
use crate::error::{ApiError, Result};

#[derive(Deserialize)]
pub struct ImportQuery {
    pub source: String,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub chunks_ingested: usize,
}

/// POST /conversations?source=chatgpt|claude|grok — body is the provider's
/// raw export file. Each parsed conversation is deduplicated by
/// (external_id, source), then run through the same chunk/tag/embed/upsert
/// pipeline captures use.
pub async fn import_conversations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<Json<ImportResponse>> {
    let parsed: Vec<ParsedConversation> = match query.source.as_str() {
        "chatgpt" => chatgpt::parse_export(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?,
        "claude" => {
            claude::parse_json(&body, "claude-import").map_err(|e| ApiError::BadRequest(e.to_string()))?
        }
        "grok" => grok::parse_json(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?,
        other => return Err(ApiError::BadRequest(format!("unknown import source: {other}"))),
    };

    let mut imported = 0;
    let mut skipped_duplicates = 0;
    let mut chunks_ingested = 0;

    for conv in &parsed {
        let full_text = conv.full_text();
        let normalized = NormalizedConversation {
            external_id: conv.external_id.clone(),
            source: query.source.clone(),
            title: conv.title.clone(),
            full_text: full_text.clone(),
            message_count: conv.messages.len() as i64,
            created_at: conv.created_at,
        };

        let (id, fresh) = state.memory.insert_conversation(&normalized)?;
        if !fresh {
            skipped_duplicates += 1;
            continue;
        }
        imported += 1;

        let timestamp = conv.created_at.unwrap_or_else(chrono::Utc::now);
        let count = jarvis_memory::ingest_text(
            &state.memory,
            state.vector_store.as_ref(),
            &state.embedder,
            "conversation",
            &id.to_string(),
            Some(conv.title.as_str()),
            &full_text,
            timestamp,
            state.config.memory.min_chunk_chars,
            state.config.memory.max_chunk_chars,
        )
        .await?;
        chunks_ingested += count;

        state.memory.set_conversation_status(id, CaptureStatus::Completed)?;
    }

    Ok(Json(ImportResponse { imported, skipped_duplicates, chunks_ingested }))
}
