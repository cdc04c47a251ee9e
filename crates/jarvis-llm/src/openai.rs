//! OpenAI-backed [`LlmBackend`] (C11). Request shape grounded on
//! `skynet-agent::openai::OpenAiProvider` (bearer auth, JSON body,
//! 429/`retry-after` and non-2xx handling); prompt and parse contract
//! grounded on `classification/entity_classifier.py`'s
//! `classify_entities_batch` (numbered-entity prompt, `gpt-4o-mini`,
//! `temperature=0`, `response_format: json_object`, markdown-fence
//! stripping, NOISE fallback on any failure).

use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use jarvis_core::llm::LlmBackend;
use jarvis_core::types::EntityType;

const CLASSIFICATION_PROMPT: &str = "You are an entity classifier for a bilingual (Danish and English) \
personal knowledge system.\n\n\
Classify each entity below as ONE of: PERSON, PROJECT, COMPANY, TOOL, TOPIC, or NOISE\n\n\
Rules:\n\
- PERSON: actual human names only\n\
- PROJECT: named projects or products\n\
- COMPANY: organization names\n\
- TOOL: software tools/platforms\n\
- TOPIC: subjects or concepts\n\
- NOISE: common words, phrases, verbs, articles\n\n\
Return ONLY a JSON object mapping each entity to its classification:\n\
{{\"Entity Name\": \"CLASSIFICATION\", ...}}\n\n\
Entities to classify:\n{entities}";

#[derive(Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, "https://api.openai.com".to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self { client: reqwest::Client::new(), api_key, base_url }
    }

    fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Strips ```json fences (or bare ``` fences) a model sometimes wraps its
/// JSON in despite `response_format: json_object`.
fn strip_code_fences(text: &str) -> &str {
    if let Some(after) = text.split("```json").nth(1) {
        return after.split("```").next().unwrap_or(after).trim();
    }
    if text.contains("```") {
        let mut parts = text.splitn(3, "```");
        parts.next();
        if let Some(body) = parts.next() {
            return body.trim();
        }
    }
    text.trim()
}

async fn chat_completion(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    prompt: &str,
    json_object: bool,
    max_tokens: u32,
) -> anyhow::Result<String> {
    let mut body = json!({
        "model": "gpt-4o-mini",
        "max_tokens": max_tokens,
        "temperature": 0,
        "messages": [{"role": "user", "content": prompt}],
    });
    if json_object {
        body["response_format"] = json!({"type": "json_object"});
    }

    let resp = client.post(url).bearer_auth(api_key).header("content-type", "application/json").json(&body).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI API error ({status}): {text}");
    }

    let parsed: ChatCompletionResponse = resp.json().await?;
    let content = parsed.choices.into_iter().next().map(|c| c.message.content).unwrap_or_default();
    Ok(content)
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn classify_entities(&self, names: &[String]) -> anyhow::Result<Vec<(String, EntityType)>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let entities_str = names.iter().enumerate().map(|(i, n)| format!("{}. {n}", i + 1)).collect::<Vec<_>>().join("\n");
        let prompt = CLASSIFICATION_PROMPT.replace("{entities}", &entities_str);

        let fallback = || names.iter().map(|n| (n.clone(), EntityType::Noise)).collect();

        let content = match chat_completion(&self.client, &self.chat_url(), &self.api_key, &prompt, true, 2000).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "entity classification request failed, defaulting to NOISE");
                return Ok(fallback());
            }
        };

        let stripped = strip_code_fences(&content);
        let raw: std::collections::HashMap<String, String> = match serde_json::from_str(stripped) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "entity classification response was not valid JSON, defaulting to NOISE");
                return Ok(fallback());
            }
        };

        Ok(names
            .iter()
            .map(|name| {
                let entity_type = raw.get(name).and_then(|s| EntityType::from_str(s).ok()).unwrap_or(EntityType::Noise);
                (name.clone(), entity_type)
            })
            .collect())
    }

    async fn summarize(&self, text: &str, instructions: &str) -> anyhow::Result<String> {
        let prompt = format!("{instructions}\n\n{text}");
        chat_completion(&self.client, &self.chat_url(), &self.api_key, &prompt, false, 1024).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fenced_block() {
        let raw = "```json\n{\"Bob\": \"PERSON\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"Bob\": \"PERSON\"}");
    }

    #[test]
    fn strips_bare_fenced_block() {
        let raw = "```\n{\"Bob\": \"PERSON\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"Bob\": \"PERSON\"}");
    }

    #[test]
    fn passes_through_unfenced_text() {
        assert_eq!(strip_code_fences("{\"Bob\": \"PERSON\"}"), "{\"Bob\": \"PERSON\"}");
    }
}
