//! Grok export parser, ported from
//! `original_source/server/src/jarvis_server/imports/grok.py`.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::{NormalizedMessage, ParsedConversation};
use crate::error::Result;

pub fn parse_json(raw: &[u8]) -> Result<Vec<ParsedConversation>> {
    let data: Value = serde_json::from_slice(raw)?;

    if let Some(items) = data.as_array() {
        return Ok(items
            .iter()
            .enumerate()
            .filter_map(|(i, conv)| parse_single(conv, &format!("grok_{i}")))
            .collect());
    }

    let conversations = data
        .get("conversations")
        .or_else(|| data.get("chats"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_else(|| vec![data.clone()]);

    Ok(conversations
        .iter()
        .enumerate()
        .filter_map(|(i, conv)| parse_single(conv, &format!("grok_{i}")))
        .collect())
}

fn parse_single(conv: &Value, fallback_id: &str) -> Option<ParsedConversation> {
    let conv_id = conv
        .get("id")
        .or_else(|| conv.get("conversationId"))
        .and_then(|v| v.as_str())
        .unwrap_or(fallback_id)
        .to_string();
    let title = conv
        .get("title")
        .or_else(|| conv.get("name"))
        .and_then(|v| v.as_str())
        .unwrap_or("Grok Conversation")
        .to_string();

    let raw_messages = conv
        .get("messages")
        .or_else(|| conv.get("turns"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let messages: Vec<NormalizedMessage> = raw_messages
        .iter()
        .filter_map(|msg| {
            let raw_role = msg
                .get("role")
                .or_else(|| msg.get("author"))
                .or_else(|| msg.get("sender"))
                .and_then(|v| v.as_str())?;
            let role = match raw_role {
                "human" | "user" => "user",
                "assistant" | "grok" | "ai" => "assistant",
                _ => return None,
            };

            let content = match msg.get("content").or_else(|| msg.get("text")).or_else(|| msg.get("message")) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Array(parts)) => parts.iter().map(value_to_string).collect::<Vec<_>>().join(" "),
                _ => return None,
            };
            let content = content.trim().to_string();
            if content.is_empty() {
                return None;
            }

            let timestamp_value = msg.get("timestamp").or_else(|| msg.get("created_at"));
            let timestamp = timestamp_value.and_then(parse_timestamp);

            Some(NormalizedMessage { role: role.to_string(), content, timestamp })
        })
        .collect();

    if messages.is_empty() {
        return None;
    }
    let created_at = messages.first().and_then(|m| m.timestamp);
    Some(ParsedConversation { external_id: conv_id, title, source: "grok", messages, created_at })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(secs) = value.as_f64() {
        return Utc.timestamp_opt(secs as i64, 0).single();
    }
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00")).ok())
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_role_aliases() {
        let raw = br#"{"messages": [{"author": "human", "text": "hey"}, {"author": "grok", "text": "hi"}]}"#;
        let convs = parse_json(raw).unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].messages[0].role, "user");
        assert_eq!(convs[0].messages[1].role, "assistant");
    }
}
