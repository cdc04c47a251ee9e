//! Conversation import format parsers (§4.3 "Supplemented"), one module
//! per export provider. Each normalizes its source JSON shape into a
//! [`NormalizedMessage`]/[`ParsedConversation`] pair for the ingest
//! pipeline to chunk/tag/embed.

pub mod chatgpt;
pub mod claude;
pub mod grok;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    pub role: String,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ParsedConversation {
    pub external_id: String,
    pub title: String,
    pub source: &'static str,
    pub messages: Vec<NormalizedMessage>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ParsedConversation {
    /// Render messages into one plain-text blob in speaker order, the
    /// input to C4a chunking.
    pub fn full_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
