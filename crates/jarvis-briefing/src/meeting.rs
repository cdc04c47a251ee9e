//! Pre-meeting brief synthesis (§4.10). Touchpoint gathering is grounded
//! line-for-line on `meetings/briefs.py`'s `gather_meeting_context`
//! (title-word + attendee-name search terms, 30-day lookback, dedup by
//! point id, top-N formatting); the freeform LLM brief that file produces
//! is replaced with a rule-based talking-point synthesis per §4.10.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use jarvis_core::types::{CalendarEvent, DetectedPattern, PatternType};
use jarvis_memory::search::{MemorySearch, SearchRequest, SearchResult};

use crate::error::Result;

const STOPWORDS: &[&str] = &["meeting", "call", "sync", "with", "about", "the", "and", "for"];
const MAX_TITLE_TERMS: usize = 3;
const MAX_ATTENDEE_TERMS: usize = 5;
const MAX_TOUCHPOINTS: usize = 10;
const MAX_TALKING_POINTS: usize = 5;
const OPEN_LOOP_TYPES: &[PatternType] = &[
    PatternType::BrokenPromise,
    PatternType::UnfinishedBusiness,
    PatternType::StalePerson,
    PatternType::RecurringPerson,
];

#[derive(Debug, Clone, Serialize)]
pub struct MeetingBrief {
    pub event_id: String,
    pub attendee_names: Vec<String>,
    pub talking_points: Vec<String>,
    pub touchpoints_found: usize,
}

fn attendee_names(event: &CalendarEvent) -> Vec<String> {
    event
        .attendees
        .iter()
        .take(MAX_ATTENDEE_TERMS)
        .filter_map(|a| {
            a.name.clone().or_else(|| {
                a.email
                    .as_ref()
                    .and_then(|e| e.split('@').next())
                    .map(|s| s.to_string())
            })
        })
        .filter(|n| n.len() > 2)
        .collect()
}

fn title_search_terms(event: &CalendarEvent) -> Vec<String> {
    let Some(summary) = event.summary.as_deref() else {
        return vec![];
    };
    summary
        .split_whitespace()
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(&w.to_lowercase().as_str()))
        .take(MAX_TITLE_TERMS)
        .map(|s| s.to_string())
        .collect()
}

/// Search memory for context relevant to the meeting: title words plus
/// attendee names, each run as a 30-day-lookback query, deduplicated by
/// point id, capped at [`MAX_TOUCHPOINTS`].
pub async fn gather_touchpoints(
    search: &dyn MemorySearch,
    event: &CalendarEvent,
    now: DateTime<Utc>,
) -> Result<Vec<SearchResult>> {
    let mut terms = title_search_terms(event);
    terms.extend(attendee_names(event));
    if terms.is_empty() {
        return Ok(vec![]);
    }

    let thirty_days_ago = now - Duration::days(30);
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for term in terms {
        let request = SearchRequest {
            query: term,
            limit: 5,
            start_date: Some(thirty_days_ago),
            end_date: None,
            sources: vec![],
        };
        let results = search.search(&request).await?;
        for r in results {
            if seen.insert(r.id.clone()) {
                out.push(r);
            }
        }
    }
    out.truncate(MAX_TOUCHPOINTS);
    Ok(out)
}

/// Active open loops (broken promises, unfinished threads, stale/recurring
/// people) whose description or key mentions one of the attendees.
pub fn open_loops_for_attendees(
    conn: &Connection,
    attendees: &[String],
) -> Result<Vec<DetectedPattern>> {
    if attendees.is_empty() {
        return Ok(vec![]);
    }
    let patterns = jarvis_enrich::db::active_patterns_by_type(conn, OPEN_LOOP_TYPES)?;
    Ok(patterns
        .into_iter()
        .filter(|p| {
            attendees.iter().any(|name| {
                let name_lower = name.to_lowercase();
                p.pattern_key.to_lowercase().contains(&name_lower)
                    || p.description.to_lowercase().contains(&name_lower)
            })
        })
        .collect())
}

/// Rank order: overdue promises, then recent-topic touchpoints, then other
/// pending commitments, then fallback generics if nothing else surfaced.
fn synthesize_talking_points(
    open_loops: &[DetectedPattern],
    touchpoints: &[SearchResult],
    event: &CalendarEvent,
) -> Vec<String> {
    let mut points = Vec::new();

    let mut overdue: Vec<&DetectedPattern> = open_loops
        .iter()
        .filter(|p| p.pattern_type == PatternType::BrokenPromise)
        .collect();
    overdue.sort_by(|a, b| a.last_seen.cmp(&b.last_seen));
    for p in overdue {
        if points.len() >= MAX_TALKING_POINTS {
            break;
        }
        points.push(format!("Overdue: {}", p.description));
    }

    for t in touchpoints {
        if points.len() >= MAX_TALKING_POINTS {
            break;
        }
        let preview = if t.text_preview.len() > 120 {
            format!("{}...", &t.text_preview[..120])
        } else {
            t.text_preview.clone()
        };
        points.push(format!("Recent topic ({}): {}", t.source, preview));
    }

    for p in open_loops
        .iter()
        .filter(|p| p.pattern_type != PatternType::BrokenPromise)
    {
        if points.len() >= MAX_TALKING_POINTS {
            break;
        }
        points.push(format!("Pending: {}", p.description));
    }

    if points.is_empty() {
        points.push(format!(
            "No prior context found for {}; treat as a new topic.",
            event.summary.as_deref().unwrap_or("this meeting")
        ));
        points.push("Confirm agenda and desired outcome at the start.".to_string());
    }

    points.truncate(MAX_TALKING_POINTS);
    points
}

pub async fn compose_meeting_brief(
    event: &CalendarEvent,
    search: &dyn MemorySearch,
    patterns_conn: &Connection,
    now: DateTime<Utc>,
) -> Result<MeetingBrief> {
    let attendees = attendee_names(event);
    let touchpoints = gather_touchpoints(search, event, now).await?;
    let open_loops = open_loops_for_attendees(patterns_conn, &attendees)?;
    let talking_points = synthesize_talking_points(&open_loops, &touchpoints, event);

    Ok(MeetingBrief {
        event_id: event.id.clone(),
        attendee_names: attendees,
        touchpoints_found: touchpoints.len(),
        talking_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jarvis_core::types::Attendee;
    use jarvis_enrich::db::init_db;
    use jarvis_enrich::patterns::replace_active_cohort;
    use std::sync::Mutex as StdMutex;
    use uuid::Uuid;

    fn sample_event() -> CalendarEvent {
        CalendarEvent {
            id: "evt-1".to_string(),
            summary: Some("Roadmap sync with Priya".to_string()),
            description: None,
            location: None,
            start_time: Some(Utc::now() + Duration::hours(2)),
            attendees: vec![Attendee {
                name: Some("Priya Shah".to_string()),
                email: Some("priya@example.com".to_string()),
            }],
        }
    }

    struct FakeSearch(Vec<SearchResult>);

    #[async_trait]
    impl MemorySearch for FakeSearch {
        async fn search(&self, _request: &SearchRequest) -> jarvis_memory::error::Result<Vec<SearchResult>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn title_search_terms_skip_stopwords_and_short_words() {
        let event = sample_event();
        let terms = title_search_terms(&event);
        assert!(terms.contains(&"Roadmap".to_string()));
        assert!(!terms.iter().any(|t| t.eq_ignore_ascii_case("with")));
    }

    #[test]
    fn attendee_names_falls_back_to_email_prefix() {
        let mut event = sample_event();
        event.attendees = vec![Attendee { name: None, email: Some("jdoe@example.com".to_string()) }];
        assert_eq!(attendee_names(&event), vec!["jdoe".to_string()]);
    }

    #[tokio::test]
    async fn gather_touchpoints_dedups_by_id_across_terms() {
        let event = sample_event();
        let shared = SearchResult {
            id: "pt-1".to_string(),
            score: 0.9,
            text_preview: "discussed roadmap".to_string(),
            timestamp: Utc::now(),
            source: "screen".to_string(),
            metadata: serde_json::json!({}),
        };
        let search = FakeSearch(vec![shared.clone()]);
        let touchpoints = gather_touchpoints(&search, &event, Utc::now()).await.unwrap();
        assert_eq!(touchpoints.len(), 1);
        assert_eq!(touchpoints[0].id, "pt-1");
    }

    #[test]
    fn open_loops_filters_to_mentions_of_attendee() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        let now = Utc::now();
        let matching = DetectedPattern {
            id: Uuid::new_v4(),
            pattern_type: PatternType::BrokenPromise,
            pattern_key: "send doc".to_string(),
            description: "Commitment made 10 days ago: 'send doc to Priya'".to_string(),
            frequency: 1,
            first_seen: now,
            last_seen: now,
            suggested_action: None,
            conversation_ids: vec![],
            detected_at: now,
            status: jarvis_core::types::PatternStatus::Active,
        };
        let unrelated = DetectedPattern {
            pattern_key: "bob".to_string(),
            description: "Recurring person: bob".to_string(),
            pattern_type: PatternType::RecurringPerson,
            ..matching.clone()
        };
        let locked = StdMutex::new(conn);
        replace_active_cohort(&locked, &[matching.clone(), unrelated]).unwrap();
        let conn = locked.into_inner().unwrap();

        let found = open_loops_for_attendees(&conn, &["Priya Shah".to_string()]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_key, "send doc");
    }

    #[test]
    fn synthesize_ranks_overdue_before_touchpoints_and_pending() {
        let event = sample_event();
        let now = Utc::now();
        let overdue = DetectedPattern {
            id: Uuid::new_v4(),
            pattern_type: PatternType::BrokenPromise,
            pattern_key: "k".to_string(),
            description: "overdue thing".to_string(),
            frequency: 1,
            first_seen: now,
            last_seen: now,
            suggested_action: None,
            conversation_ids: vec![],
            detected_at: now,
            status: jarvis_core::types::PatternStatus::Active,
        };
        let pending = DetectedPattern {
            pattern_type: PatternType::UnfinishedBusiness,
            description: "pending thing".to_string(),
            ..overdue.clone()
        };
        let touchpoint = SearchResult {
            id: "pt-1".to_string(),
            score: 0.5,
            text_preview: "topic detail".to_string(),
            timestamp: now,
            source: "screen".to_string(),
            metadata: serde_json::json!({}),
        };
        let points = synthesize_talking_points(&[overdue, pending], &[touchpoint], &event);
        assert!(points[0].starts_with("Overdue:"));
        assert!(points[1].starts_with("Recent topic"));
        assert!(points[2].starts_with("Pending:"));
    }

    #[test]
    fn synthesize_falls_back_to_generics_when_nothing_found() {
        let event = sample_event();
        let points = synthesize_talking_points(&[], &[], &event);
        assert_eq!(points.len(), 2);
        assert!(points[0].contains("No prior context"));
    }
}
