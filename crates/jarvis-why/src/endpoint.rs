//! `GET /why/{suggestion_type}/{id}` dispatch: each suggestion kind has its
//! own reasons/confidence formula, computed over data the caller has
//! already fetched (store access belongs to the server layer, not here).

use chrono::{DateTime, Utc};
use jarvis_core::error::{JarvisError, Result};
use jarvis_core::types::{CalendarEvent, Capture, Conversation, DetectedPattern, Meeting, WhyPayload};

use crate::builder::{
    build_why_from_calendar, build_why_from_capture, build_why_from_conversation,
    build_why_from_pattern, build_why_payload,
};

pub fn pattern_why(pattern: &DetectedPattern) -> WhyPayload {
    let mut reasons = vec![
        format!("Detected {} times", pattern.frequency),
        format!("Pattern type: {}", title_case(&pattern.pattern_type.to_string())),
    ];
    if pattern.suggested_action.is_some() {
        reasons.push("Suggested action available".to_string());
    }

    let confidence = (0.5 + pattern.frequency as f64 * 0.05).min(0.95);

    let conversation_ids: Vec<String> = pattern.conversation_ids.iter().map(|id| id.to_string()).collect();

    build_why_from_pattern(
        &pattern.id.to_string(),
        &pattern.description,
        pattern.last_seen,
        reasons,
        confidence,
        &conversation_ids,
    )
}

pub fn meeting_why(meeting: &Meeting) -> WhyPayload {
    let platform = meeting.platform.as_deref().unwrap_or("unknown platform");
    let mut reasons = vec![format!("Meeting detected on {platform}")];

    let confidence;
    let snippet;
    let source_type;
    if let Some(event) = &meeting.calendar_event {
        let summary = event.summary.as_deref().unwrap_or("");
        reasons.push(format!("Scheduled event: {summary}"));
        confidence = 0.9;
        snippet = summary.to_string();
        source_type = jarvis_core::types::SourceType::Calendar;
    } else {
        confidence = 0.7;
        snippet = format!("Meeting on {platform}");
        source_type = jarvis_core::types::SourceType::Capture;
    }

    let source = jarvis_core::types::Source {
        source_type,
        id: meeting.id.clone(),
        timestamp: meeting.detected_at,
        snippet,
        url: Some(format!("/meetings/{}", meeting.id)),
    };

    build_why_payload(reasons, confidence, vec![source])
}

pub fn capture_why(capture: &Capture) -> WhyPayload {
    let mut reasons = vec![
        format!("Screen capture from {}", capture.timestamp.format("%Y-%m-%d %H:%M")),
        format!("Monitor {}", capture.monitor_index),
    ];
    let has_text = capture.ocr_text.as_deref().is_some_and(|t| !t.is_empty());
    if has_text {
        reasons.push("Contains extracted text".to_string());
    }
    let confidence = if has_text { 0.6 } else { 0.4 };

    build_why_from_capture(
        &capture.id.to_string(),
        capture.ocr_text.as_deref().unwrap_or(""),
        capture.timestamp,
        reasons,
        confidence,
        vec![],
    )
}

/// `now` is threaded in rather than read from the clock so this stays a
/// pure function. A null `conversation_date` defaults to 0.6 confidence,
/// same as a conversation older than 7 days.
pub fn conversation_why(conversation: &Conversation, now: DateTime<Utc>) -> WhyPayload {
    let mut reasons = vec![
        format!("Conversation from {}", conversation.source),
        format!("{} messages", conversation.message_count),
    ];

    let recent = conversation
        .conversation_date
        .is_some_and(|date| (now - date).num_days() < 7);
    if recent {
        reasons.push("Recent conversation".to_string());
    }
    let confidence = if recent { 0.8 } else { 0.6 };

    let effective_date = conversation.conversation_date.unwrap_or(conversation.imported_at);

    build_why_from_conversation(
        &conversation.id.to_string(),
        &conversation.title,
        effective_date,
        reasons,
        confidence,
        vec![],
    )
}

pub fn calendar_why(event: &CalendarEvent, now: DateTime<Utc>) -> WhyPayload {
    let summary = event.summary.clone().unwrap_or_else(|| "Untitled Event".to_string());
    let mut reasons = vec![format!("Scheduled event: {summary}")];

    let confidence = match event.start_time {
        Some(start) => {
            let seconds_until = (start - now).num_seconds();
            if seconds_until < 3600 {
                reasons.push("Starting soon".to_string());
                0.95
            } else if seconds_until < 86_400 {
                reasons.push("Today".to_string());
                0.85
            } else if seconds_until < 7 * 86_400 {
                0.7
            } else {
                0.5
            }
        }
        None => 0.5,
    };

    build_why_from_calendar(
        &event.id,
        &summary,
        event.start_time.unwrap_or(now),
        reasons,
        confidence,
        vec![],
    )
}

/// Dispatches on the suggestion type named in `GET /why/{suggestion_type}/{id}`.
/// The lookup itself (and the resulting `NotFound`) is the server layer's
/// job; this only rejects an unknown type.
pub enum WhyTarget<'a> {
    Pattern(&'a DetectedPattern),
    Meeting(&'a Meeting),
    Capture(&'a Capture),
    Conversation(&'a Conversation),
    Calendar(&'a CalendarEvent),
}

pub fn suggestion_type_name(target: &WhyTarget) -> &'static str {
    match target {
        WhyTarget::Pattern(_) => "pattern",
        WhyTarget::Meeting(_) => "meeting",
        WhyTarget::Capture(_) => "capture",
        WhyTarget::Conversation(_) => "conversation",
        WhyTarget::Calendar(_) => "calendar",
    }
}

pub fn build_why(target: WhyTarget, now: DateTime<Utc>) -> WhyPayload {
    match target {
        WhyTarget::Pattern(p) => pattern_why(p),
        WhyTarget::Meeting(m) => meeting_why(m),
        WhyTarget::Capture(c) => capture_why(c),
        WhyTarget::Conversation(c) => conversation_why(c, now),
        WhyTarget::Calendar(e) => calendar_why(e, now),
    }
}

pub fn parse_suggestion_type(s: &str) -> Result<&'static str> {
    match s {
        "pattern" => Ok("pattern"),
        "meeting" => Ok("meeting"),
        "capture" => Ok("capture"),
        "conversation" => Ok("conversation"),
        "calendar" => Ok("calendar"),
        other => Err(JarvisError::InvalidInput(format!(
            "unknown suggestion type: {other}. must be: pattern, meeting, capture, conversation, or calendar"
        ))),
    }
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_core::types::{CaptureStatus, ConversationSource, PatternStatus, PatternType};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample_pattern(frequency: i32) -> DetectedPattern {
        DetectedPattern {
            id: Uuid::nil(),
            pattern_type: PatternType::RecurringPerson,
            pattern_key: "alice".to_string(),
            description: "Alice mentioned often".to_string(),
            frequency,
            first_seen: now(),
            last_seen: now(),
            suggested_action: Some("check in".to_string()),
            conversation_ids: vec![],
            detected_at: now(),
            status: PatternStatus::Active,
        }
    }

    #[test]
    fn pattern_confidence_scales_with_frequency_and_caps_at_95() {
        assert_eq!(pattern_why(&sample_pattern(0)).confidence, 0.5);
        assert_eq!(pattern_why(&sample_pattern(9)).confidence, 0.95);
        assert_eq!(pattern_why(&sample_pattern(100)).confidence, 0.95);
    }

    #[test]
    fn pattern_type_reason_is_title_cased() {
        let payload = pattern_why(&sample_pattern(3));
        assert!(payload.reasons.iter().any(|r| r == "Pattern type: Recurring Person"));
    }

    #[test]
    fn meeting_with_calendar_link_is_more_confident() {
        let linked = Meeting {
            id: "m1".to_string(),
            platform: Some("zoom".to_string()),
            detected_at: now(),
            calendar_event: Some(CalendarEvent {
                id: "e1".to_string(),
                summary: Some("Standup".to_string()),
                description: None,
                location: None,
                start_time: Some(now()),
                attendees: vec![],
            }),
        };
        let unlinked = Meeting {
            calendar_event: None,
            ..linked.clone()
        };
        assert_eq!(meeting_why(&linked).confidence, 0.9);
        assert_eq!(meeting_why(&unlinked).confidence, 0.7);
    }

    #[test]
    fn capture_confidence_depends_on_ocr_text() {
        let with_text = Capture {
            id: Uuid::nil(),
            timestamp: now(),
            monitor_index: 0,
            width: 100,
            height: 100,
            byte_size: 10,
            filepath: "x.png".to_string(),
            ocr_text: Some("hello".to_string()),
            status: CaptureStatus::Completed,
        };
        let without_text = Capture {
            ocr_text: None,
            ..with_text.clone()
        };
        assert_eq!(capture_why(&with_text).confidence, 0.6);
        assert_eq!(capture_why(&without_text).confidence, 0.4);
    }

    #[test]
    fn conversation_recent_date_boosts_confidence() {
        let recent = Conversation {
            id: Uuid::nil(),
            external_id: "c1".to_string(),
            source: ConversationSource::Claude,
            title: "Project planning".to_string(),
            full_text: String::new(),
            message_count: 5,
            conversation_date: Some(now() - chrono::Duration::days(1)),
            imported_at: now(),
            processing_status: CaptureStatus::Completed,
        };
        let stale = Conversation {
            conversation_date: Some(now() - chrono::Duration::days(30)),
            ..recent.clone()
        };
        let no_date = Conversation {
            conversation_date: None,
            ..recent.clone()
        };
        assert_eq!(conversation_why(&recent, now()).confidence, 0.8);
        assert_eq!(conversation_why(&stale, now()).confidence, 0.6);
        assert_eq!(conversation_why(&no_date, now()).confidence, 0.6);
    }

    #[test]
    fn calendar_confidence_tiers_by_time_until_start() {
        let soon = CalendarEvent {
            id: "e1".to_string(),
            summary: Some("Sync".to_string()),
            description: None,
            location: None,
            start_time: Some(now() + chrono::Duration::minutes(30)),
            attendees: vec![],
        };
        let today = CalendarEvent {
            start_time: Some(now() + chrono::Duration::hours(5)),
            ..soon.clone()
        };
        let later = CalendarEvent {
            start_time: Some(now() + chrono::Duration::days(3)),
            ..soon.clone()
        };
        let far_future = CalendarEvent {
            start_time: Some(now() + chrono::Duration::days(30)),
            ..soon.clone()
        };
        let unscheduled = CalendarEvent {
            start_time: None,
            ..soon.clone()
        };
        assert_eq!(calendar_why(&soon, now()).confidence, 0.95);
        assert_eq!(calendar_why(&today, now()).confidence, 0.85);
        assert_eq!(calendar_why(&later, now()).confidence, 0.7);
        assert_eq!(calendar_why(&far_future, now()).confidence, 0.5);
        assert_eq!(calendar_why(&unscheduled, now()).confidence, 0.5);
    }

    #[test]
    fn parse_suggestion_type_rejects_unknown_kind() {
        assert!(parse_suggestion_type("widget").is_err());
        assert!(parse_suggestion_type("pattern").is_ok());
    }
}
