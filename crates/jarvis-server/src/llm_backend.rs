//! Picks the concrete [`LlmBackend`] at startup (§4.12: "the core must
//! tolerate absence [of credentials] and fall back to deterministic
//! rule-based equivalents"). An enum rather than `Box<dyn LlmBackend>`
//! so it can also be wrapped in `jarvis_llm::CachingBackend<B>`, which
//! needs a concrete, `Clone`-able `B`.

use async_trait::async_trait;

use jarvis_core::llm::LlmBackend;
use jarvis_core::types::EntityType;
use jarvis_llm::{HeuristicBackend, OpenAiBackend};

#[derive(Clone)]
pub enum LlmChoice {
    Heuristic(HeuristicBackend),
    OpenAi(OpenAiBackend),
}

impl LlmChoice {
    pub fn from_config(config: &jarvis_core::config::LlmConfig) -> Self {
        match &config.openai_api_key {
            Some(key) if !key.is_empty() => {
                LlmChoice::OpenAi(OpenAiBackend::with_base_url(key.clone(), config.openai_base_url.clone()))
            }
            _ => LlmChoice::Heuristic(HeuristicBackend),
        }
    }
}

#[async_trait]
impl LlmBackend for LlmChoice {
    async fn classify_entities(&self, names: &[String]) -> anyhow::Result<Vec<(String, EntityType)>> {
        match self {
            LlmChoice::Heuristic(b) => b.classify_entities(names).await,
            LlmChoice::OpenAi(b) => b.classify_entities(names).await,
        }
    }

    async fn summarize(&self, text: &str, instructions: &str) -> anyhow::Result<String> {
        match self {
            LlmChoice::Heuristic(b) => b.summarize(text, instructions).await,
            LlmChoice::OpenAi(b) => b.summarize(text, instructions).await,
        }
    }
}
