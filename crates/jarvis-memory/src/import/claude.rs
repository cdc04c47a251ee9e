//! Claude export parser, ported from
//! `original_source/server/src/jarvis_server/imports/claude.py`. Claude
//! exports vary in shape; this handles both a bare JSON export and the
//! flattened contents of a ZIP export (caller extracts entries first —
//! zip handling itself belongs to the upload endpoint, not this parser).

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{NormalizedMessage, ParsedConversation};
use crate::error::Result;

/// Parse one Claude export JSON document, which may be a single
/// conversation object, a list of conversations, or a wrapper with a
/// `conversations`/`chats` key.
pub fn parse_json(raw: &[u8], fallback_id: &str) -> Result<Vec<ParsedConversation>> {
    let data: Value = serde_json::from_slice(raw)?;
    Ok(parse_value(&data, fallback_id))
}

fn parse_value(data: &Value, fallback_id: &str) -> Vec<ParsedConversation> {
    if let Some(items) = data.as_array() {
        return items
            .iter()
            .enumerate()
            .filter_map(|(i, conv)| parse_single(conv, &format!("{fallback_id}_{i}")))
            .collect();
    }

    if let Some(obj) = data.as_object() {
        if obj.contains_key("chat_messages") || obj.contains_key("messages") {
            return parse_single(data, fallback_id).into_iter().collect();
        }
        for key in ["conversations", "chats"] {
            if let Some(list) = obj.get(key).and_then(|v| v.as_array()) {
                return list
                    .iter()
                    .enumerate()
                    .filter_map(|(i, conv)| parse_single(conv, &format!("{fallback_id}_{i}")))
                    .collect();
            }
        }
    }
    Vec::new()
}

fn parse_single(conv: &Value, fallback_id: &str) -> Option<ParsedConversation> {
    let conv_id = conv
        .get("uuid")
        .or_else(|| conv.get("id"))
        .and_then(|v| v.as_str())
        .unwrap_or(fallback_id)
        .to_string();
    let title = conv
        .get("name")
        .or_else(|| conv.get("title"))
        .and_then(|v| v.as_str())
        .unwrap_or("Untitled")
        .to_string();

    let raw_messages = conv
        .get("chat_messages")
        .or_else(|| conv.get("messages"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let messages: Vec<NormalizedMessage> = raw_messages
        .iter()
        .filter_map(|msg| {
            let raw_role = msg.get("sender").or_else(|| msg.get("role")).and_then(|v| v.as_str())?;
            let role = match raw_role {
                "human" => "user",
                "assistant" => "assistant",
                _ => return None,
            };

            let content = match msg.get("text").or_else(|| msg.get("content")) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Array(parts)) => parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join(" "),
                _ => return None,
            };
            let content = content.trim().to_string();
            if content.is_empty() {
                return None;
            }

            let timestamp = msg
                .get("created_at")
                .or_else(|| msg.get("timestamp"))
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00")).ok())
                .map(|d| d.with_timezone(&Utc));

            Some(NormalizedMessage { role: role.to_string(), content, timestamp })
        })
        .collect();

    if messages.is_empty() {
        return None;
    }
    let created_at = messages.first().and_then(|m| m.timestamp);
    Some(ParsedConversation { external_id: conv_id, title, source: "claude", messages, created_at })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_messages_with_human_assistant_roles() {
        let raw = br#"{
            "uuid": "c-1",
            "name": "Design review",
            "chat_messages": [
                {"sender": "human", "text": "what do you think?"},
                {"sender": "assistant", "text": "looks solid"}
            ]
        }"#;
        let convs = parse_json(raw, "fallback").unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].messages[0].role, "user");
        assert_eq!(convs[0].messages[1].role, "assistant");
    }

    #[test]
    fn unwraps_a_conversations_list_wrapper() {
        let raw = br#"{"conversations": [{"id": "x", "messages": [{"role": "human", "content": "hi"}]}]}"#;
        let convs = parse_json(raw, "fallback").unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].external_id, "x");
    }
}
