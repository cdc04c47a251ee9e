//! Narrow LLM capability interface shared by `jarvis-llm`'s concrete
//! backends and every crate that needs an optional LLM assist
//! (`jarvis-enrich::patterns`, `jarvis-why`). Kept in `jarvis-core` so
//! those crates can depend on the trait without depending on the
//! provider implementations.

use async_trait::async_trait;

use crate::types::EntityType;

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Classify a batch of entity name candidates. Implementations may
    /// return fewer entries than requested if the model declines some.
    async fn classify_entities(&self, names: &[String]) -> anyhow::Result<Vec<(String, EntityType)>>;

    /// Summarize or transform `text` under free-form `instructions`,
    /// returning the model's raw text response. Callers that need
    /// structured output (e.g. pattern suggestions) parse the response
    /// themselves.
    async fn summarize(&self, text: &str, instructions: &str) -> anyhow::Result<String>;
}
