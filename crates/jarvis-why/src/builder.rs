//! Constructs [`WhyPayload`]s with a single primary source plus optional
//! extras, and merges independently-built payloads into one.

use chrono::{DateTime, Utc};
use jarvis_core::error::{JarvisError, Result};
use jarvis_core::types::{Source, SourceType, WhyPayload};

const SNIPPET_MAX_CHARS: usize = 200;

fn truncate(s: &str) -> String {
    s.chars().take(SNIPPET_MAX_CHARS).collect()
}

pub fn build_why_payload(reasons: Vec<String>, confidence: f64, sources: Vec<Source>) -> WhyPayload {
    WhyPayload {
        reasons,
        confidence,
        sources,
    }
}

pub fn build_why_from_email(
    email_id: &str,
    email_snippet: &str,
    email_timestamp: DateTime<Utc>,
    reasons: Vec<String>,
    confidence: f64,
    additional_sources: Vec<Source>,
) -> WhyPayload {
    let mut sources = vec![Source {
        source_type: SourceType::Email,
        id: email_id.to_string(),
        timestamp: email_timestamp,
        snippet: truncate(email_snippet),
        url: Some(format!("/email/{email_id}")),
    }];
    sources.extend(additional_sources);
    build_why_payload(reasons, confidence, sources)
}

pub fn build_why_from_capture(
    capture_id: &str,
    capture_text: &str,
    capture_timestamp: DateTime<Utc>,
    reasons: Vec<String>,
    confidence: f64,
    additional_sources: Vec<Source>,
) -> WhyPayload {
    let snippet = if capture_text.is_empty() {
        "[No text extracted]".to_string()
    } else {
        truncate(capture_text)
    };
    let mut sources = vec![Source {
        source_type: SourceType::Capture,
        id: capture_id.to_string(),
        timestamp: capture_timestamp,
        snippet,
        url: Some(format!("/timeline?capture={capture_id}")),
    }];
    sources.extend(additional_sources);
    build_why_payload(reasons, confidence, sources)
}

pub fn build_why_from_calendar(
    event_id: &str,
    event_title: &str,
    event_start: DateTime<Utc>,
    reasons: Vec<String>,
    confidence: f64,
    additional_sources: Vec<Source>,
) -> WhyPayload {
    let mut sources = vec![Source {
        source_type: SourceType::Calendar,
        id: event_id.to_string(),
        timestamp: event_start,
        snippet: truncate(event_title),
        url: Some(format!("/calendar?event={event_id}")),
    }];
    sources.extend(additional_sources);
    build_why_payload(reasons, confidence, sources)
}

pub fn build_why_from_conversation(
    conversation_id: &str,
    conversation_title: &str,
    conversation_date: DateTime<Utc>,
    reasons: Vec<String>,
    confidence: f64,
    additional_sources: Vec<Source>,
) -> WhyPayload {
    let mut sources = vec![Source {
        source_type: SourceType::Conversation,
        id: conversation_id.to_string(),
        timestamp: conversation_date,
        snippet: truncate(conversation_title),
        url: Some(format!("/search?conversation={conversation_id}")),
    }];
    sources.extend(additional_sources);
    build_why_payload(reasons, confidence, sources)
}

/// `source_conversation_ids` is capped at 5, matching the original.
pub fn build_why_from_pattern(
    pattern_id: &str,
    pattern_description: &str,
    pattern_last_seen: DateTime<Utc>,
    reasons: Vec<String>,
    confidence: f64,
    source_conversation_ids: &[String],
) -> WhyPayload {
    let mut sources = vec![Source {
        source_type: SourceType::Pattern,
        id: pattern_id.to_string(),
        timestamp: pattern_last_seen,
        snippet: truncate(pattern_description),
        url: Some(format!("/workflows?pattern={pattern_id}")),
    }];
    for conv_id in source_conversation_ids.iter().take(5) {
        sources.push(Source {
            source_type: SourceType::Conversation,
            id: conv_id.clone(),
            timestamp: pattern_last_seen,
            snippet: "Related conversation".to_string(),
            url: Some(format!("/search?conversation={conv_id}")),
        });
    }
    build_why_payload(reasons, confidence, sources)
}

/// Merges independently-built payloads, taking the minimum confidence and
/// deduplicating reasons while preserving first-seen order. A single
/// payload is returned unchanged; an empty list is a caller error, not a
/// panic.
pub fn merge_why_payloads(payloads: Vec<WhyPayload>) -> Result<WhyPayload> {
    if payloads.is_empty() {
        return Err(JarvisError::InvalidInput(
            "cannot merge empty list of why payloads".to_string(),
        ));
    }
    if payloads.len() == 1 {
        return Ok(payloads.into_iter().next().unwrap());
    }

    let mut all_reasons = Vec::new();
    let mut all_sources = Vec::new();
    let mut min_confidence = 1.0_f64;

    for payload in payloads {
        all_reasons.extend(payload.reasons);
        all_sources.extend(payload.sources);
        min_confidence = min_confidence.min(payload.confidence);
    }

    let mut unique_reasons = Vec::with_capacity(all_reasons.len());
    let mut seen = std::collections::HashSet::new();
    for reason in all_reasons {
        if seen.insert(reason.clone()) {
            unique_reasons.push(reason);
        }
    }

    Ok(WhyPayload {
        reasons: unique_reasons,
        confidence: min_confidence,
        sources: all_sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn capture_snippet_truncates_at_200_chars() {
        let text = "x".repeat(500);
        let payload = build_why_from_capture("c1", &text, ts(), vec!["r".to_string()], 0.5, vec![]);
        assert_eq!(payload.sources[0].snippet.chars().count(), 200);
    }

    #[test]
    fn capture_empty_text_uses_placeholder() {
        let payload = build_why_from_capture("c1", "", ts(), vec![], 0.4, vec![]);
        assert_eq!(payload.sources[0].snippet, "[No text extracted]");
    }

    #[test]
    fn pattern_caps_related_conversations_at_five() {
        let ids: Vec<String> = (0..10).map(|i| format!("conv{i}")).collect();
        let payload = build_why_from_pattern("p1", "desc", ts(), vec![], 0.6, &ids);
        assert_eq!(payload.sources.len(), 1 + 5);
    }

    #[test]
    fn merge_single_payload_short_circuits() {
        let p = build_why_from_email("e1", "hi", ts(), vec!["a".to_string()], 0.9, vec![]);
        let merged = merge_why_payloads(vec![p.clone()]).unwrap();
        assert_eq!(merged.confidence, p.confidence);
        assert_eq!(merged.sources.len(), p.sources.len());
    }

    #[test]
    fn merge_takes_minimum_confidence_and_dedups_reasons() {
        let a = build_why_from_email("e1", "hi", ts(), vec!["shared".to_string(), "a".to_string()], 0.9, vec![]);
        let b = build_why_from_capture("c1", "hi", ts(), vec!["shared".to_string(), "b".to_string()], 0.3, vec![]);
        let merged = merge_why_payloads(vec![a, b]).unwrap();
        assert_eq!(merged.confidence, 0.3);
        assert_eq!(merged.reasons, vec!["shared", "a", "b"]);
        assert_eq!(merged.sources.len(), 2);
    }

    #[test]
    fn merge_empty_list_is_a_typed_error_not_a_panic() {
        let err = merge_why_payloads(vec![]).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }
}
