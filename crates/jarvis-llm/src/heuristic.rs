//! Deterministic, credential-free [`LlmBackend`] fallback (§4.12: "the
//! core must tolerate absence [of credentials] and fall back to
//! deterministic rule-based equivalents"). Classification reuses the
//! same name-likelihood heuristics `jarvis-enrich`'s people/project
//! scanners already apply to chunk payloads.

use async_trait::async_trait;

use jarvis_core::llm::LlmBackend;
use jarvis_core::types::EntityType;
use jarvis_enrich::people_graph::is_likely_person_name;
use jarvis_enrich::project_pulse::is_likely_project_name;

#[derive(Clone)]
pub struct HeuristicBackend;

fn classify_one(name: &str) -> EntityType {
    if is_likely_person_name(name) {
        EntityType::Person
    } else if is_likely_project_name(name) {
        EntityType::Project
    } else {
        EntityType::Noise
    }
}

/// First sentence (or first 200 chars, whichever is shorter) of `text`,
/// as a deterministic stand-in for an actual summary. `instructions` is
/// accepted for interface parity but can't meaningfully change the
/// output without a model.
fn extractive_summary(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let first_sentence = trimmed.split(['.', '\n']).next().unwrap_or(trimmed).trim();
    if first_sentence.chars().count() > 200 {
        first_sentence.chars().take(200).collect::<String>() + "..."
    } else {
        first_sentence.to_string()
    }
}

#[async_trait]
impl LlmBackend for HeuristicBackend {
    async fn classify_entities(&self, names: &[String]) -> anyhow::Result<Vec<(String, EntityType)>> {
        Ok(names.iter().map(|n| (n.clone(), classify_one(n))).collect())
    }

    async fn summarize(&self, text: &str, _instructions: &str) -> anyhow::Result<String> {
        Ok(extractive_summary(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn classifies_known_person_name() {
        let backend = HeuristicBackend;
        let result = backend.classify_entities(&["Sven Arnarsson".to_string()]).await.unwrap();
        assert_eq!(result[0].1, EntityType::Person);
    }

    #[tokio::test]
    async fn falls_back_to_noise_for_common_words() {
        let backend = HeuristicBackend;
        let result = backend.classify_entities(&["the".to_string()]).await.unwrap();
        assert_eq!(result[0].1, EntityType::Noise);
    }

    #[test]
    fn extractive_summary_takes_first_sentence() {
        let summary = extractive_summary("Shipped the new search index. Next up is caching.");
        assert_eq!(summary, "Shipped the new search index");
    }

    #[test]
    fn extractive_summary_of_empty_text_is_empty() {
        assert_eq!(extractive_summary(""), "");
    }
}
