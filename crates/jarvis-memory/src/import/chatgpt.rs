//! ChatGPT `conversations.json` export parser, ported from
//! `original_source/server/src/jarvis_server/imports/chatgpt.py`.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::{NormalizedMessage, ParsedConversation};
use crate::error::{MemoryError, Result};

/// Parse a ChatGPT `conversations.json` export (obtained via ChatGPT
/// Settings -> Data Controls -> Export data). Unparseable conversations
/// are skipped, not fatal, mirroring the original's per-item try/except.
pub fn parse_export(raw: &[u8]) -> Result<Vec<ParsedConversation>> {
    let data: Value = serde_json::from_slice(raw)?;
    let items = data
        .as_array()
        .ok_or_else(|| MemoryError::UnsupportedImport("chatgpt export root is not an array".to_string()))?;

    Ok(items.iter().filter_map(parse_conversation).collect())
}

fn parse_conversation(conv: &Value) -> Option<ParsedConversation> {
    let conv_id = conv.get("id")?.as_str()?.to_string();
    let title = conv.get("title").and_then(|t| t.as_str()).unwrap_or("Untitled").to_string();
    let mapping = conv.get("mapping")?.as_object()?;

    let mut messages: Vec<NormalizedMessage> = mapping
        .values()
        .filter_map(|node| {
            let message_data = node.get("message")?;
            let role = message_data.get("author")?.get("role")?.as_str()?;
            if !matches!(role, "user" | "assistant" | "system") {
                return None;
            }

            let content = message_data.get("content")?;
            if content.get("content_type")?.as_str()? != "text" {
                return None;
            }
            let text = content.get("parts")?.as_array()?.first()?.as_str()?.trim().to_string();
            if text.is_empty() {
                return None;
            }

            let timestamp = message_data
                .get("create_time")
                .and_then(|v| v.as_f64())
                .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single());

            Some(NormalizedMessage { role: role.to_string(), content: text, timestamp })
        })
        .collect();

    messages.sort_by_key(|m| m.timestamp.unwrap_or(DateTime::<Utc>::MIN_UTC));
    if messages.is_empty() {
        return None;
    }

    let created_at = messages.first().and_then(|m| m.timestamp);
    Some(ParsedConversation { external_id: conv_id, title, source: "chatgpt", messages, created_at })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_export() {
        let raw = br#"[{
            "id": "conv-1",
            "title": "Planning",
            "mapping": {
                "n1": {"message": {"author": {"role": "user"}, "content": {"content_type": "text", "parts": ["hello"]}, "create_time": 1700000000.0}},
                "n2": {"message": {"author": {"role": "assistant"}, "content": {"content_type": "text", "parts": ["hi there"]}, "create_time": 1700000010.0}}
            }
        }]"#;
        let convs = parse_export(raw).unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].external_id, "conv-1");
        assert_eq!(convs[0].messages.len(), 2);
        assert_eq!(convs[0].messages[0].role, "user");
    }

    #[test]
    fn skips_conversations_with_no_text_messages() {
        let raw = br#"[{"id": "conv-2", "title": "Empty", "mapping": {}}]"#;
        let convs = parse_export(raw).unwrap();
        assert!(convs.is_empty());
    }
}
