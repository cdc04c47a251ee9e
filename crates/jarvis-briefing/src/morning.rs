//! Morning briefing composer (C9). Grounded in the distilled spec's §4.10
//! field list; the overnight-window and render-spoken mechanics borrow
//! from `api/catchup.py::morning_briefing`'s calendar-plus-context
//! aggregation shape and `api/daily3.py`'s suggestion-sourcing idiom,
//! generalized onto this workspace's `DetectedPattern`/chunk-payload data
//! instead of the original's SQL tables.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike, Utc};
use jarvis_core::types::{CalendarEvent, DetectedPattern, PatternType};
use jarvis_memory::vectorstore::{VectorStore, MEMORY_CHUNKS_COLLECTION};
use rusqlite::Connection;
use serde::Serialize;

use crate::collaborators::{CalendarSource, EmailSource, PriorityEmail};
use crate::error::Result;

/// Screen-capture activity for one local hour of the overnight window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyCaptureSummary {
    pub hour: u32,
    pub capture_count: usize,
    pub top_projects: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MorningBriefing {
    pub date: NaiveDate,
    pub calendar_events: Vec<CalendarEvent>,
    pub priority_emails: Vec<PriorityEmail>,
    pub unfinished_business: Vec<DetectedPattern>,
    pub pending_promises: Vec<DetectedPattern>,
    pub pattern_alerts: Vec<DetectedPattern>,
    pub overnight_summary: Vec<HourlyCaptureSummary>,
    pub external_tasks: Vec<String>,
}

/// Fixed "yesterday 22:00 to today 08:00, both local time" window (§9 Open
/// Question). Returned as a UTC range since every timestamp this
/// workspace stores is UTC.
fn overnight_window(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_local = (today - Duration::days(1)).and_hms_opt(22, 0, 0).unwrap();
    let end_local = today.and_hms_opt(8, 0, 0).unwrap();
    (
        Local.from_local_datetime(&start_local).single().unwrap_or_else(|| Local.from_utc_datetime(&start_local)).with_timezone(&Utc),
        Local.from_local_datetime(&end_local).single().unwrap_or_else(|| Local.from_utc_datetime(&end_local)).with_timezone(&Utc),
    )
}

fn today_window(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_local = today.and_hms_opt(0, 0, 0).unwrap();
    let end_local = (today + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap();
    (
        Local.from_local_datetime(&start_local).single().unwrap_or_else(|| Local.from_utc_datetime(&start_local)).with_timezone(&Utc),
        Local.from_local_datetime(&end_local).single().unwrap_or_else(|| Local.from_utc_datetime(&end_local)).with_timezone(&Utc),
    )
}

async fn overnight_capture_summary(
    store: &dyn VectorStore,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<HourlyCaptureSummary>> {
    let points = store.scroll_payloads(MEMORY_CHUNKS_COLLECTION).await?;

    let mut by_hour: std::collections::BTreeMap<u32, (usize, std::collections::HashMap<String, usize>)> =
        std::collections::BTreeMap::new();

    for point in &points {
        let source = point.payload.get("source").and_then(|v| v.as_str()).unwrap_or("");
        if source != "screen" {
            continue;
        }
        let timestamp = point
            .payload
            .get("timestamp")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));
        let Some(ts) = timestamp else { continue };
        if ts < window_start || ts >= window_end {
            continue;
        }

        let local_hour = ts.with_timezone(&Local).hour();
        let entry = by_hour.entry(local_hour).or_insert_with(|| (0, std::collections::HashMap::new()));
        entry.0 += 1;

        if let Some(projects) = point.payload.get("projects").and_then(|v| v.as_array()) {
            for p in projects {
                if let Some(name) = p.as_str() {
                    *entry.1.entry(name.to_string()).or_insert(0) += 1;
                }
            }
        }
    }

    Ok(by_hour
        .into_iter()
        .map(|(hour, (count, projects))| {
            let mut ranked: Vec<(String, usize)> = projects.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            HourlyCaptureSummary {
                hour,
                capture_count: count,
                top_projects: ranked.into_iter().take(3).map(|(name, _)| name).collect(),
            }
        })
        .collect())
}

pub async fn compose_morning_briefing(
    calendar: &dyn CalendarSource,
    email: &dyn EmailSource,
    store: &dyn VectorStore,
    patterns_conn: &Connection,
    external_tasks: Vec<String>,
    now_local: DateTime<Local>,
) -> Result<MorningBriefing> {
    let today = now_local.date_naive();

    let (today_start, today_end) = today_window(today);
    let calendar_events = calendar.events_between(today_start, today_end).await?;

    let email_cutoff = now_local.with_timezone(&Utc) - Duration::hours(24);
    let priority_emails = email.priority_unread_since(email_cutoff).await?;

    let unfinished_business =
        jarvis_enrich::db::active_patterns_by_type(patterns_conn, &[PatternType::UnfinishedBusiness])?;
    let pending_promises =
        jarvis_enrich::db::active_patterns_by_type(patterns_conn, &[PatternType::BrokenPromise])?;
    let pattern_alerts = jarvis_enrich::db::active_patterns_by_type(
        patterns_conn,
        &[PatternType::StalePerson, PatternType::BrokenPromise, PatternType::StaleProject],
    )?;

    let (overnight_start, overnight_end) = overnight_window(today);
    let overnight_summary = overnight_capture_summary(store, overnight_start, overnight_end).await?;

    Ok(MorningBriefing {
        date: today,
        calendar_events,
        priority_emails,
        unfinished_business,
        pending_promises,
        pattern_alerts,
        overnight_summary,
        external_tasks,
    })
}

/// Renders a `MorningBriefing` as prose suitable for text-to-speech. The
/// sentence templates are local to this workspace; the composition
/// pattern (schedule line, then prose context, then fallback when
/// nothing happened) is grounded in `api/catchup.py::morning_briefing`'s
/// "Today's Schedule" / "Context" assembly.
pub fn render_spoken(briefing: &MorningBriefing) -> String {
    let mut parts = Vec::new();

    if briefing.calendar_events.is_empty() {
        parts.push("You have no meetings scheduled today.".to_string());
    } else {
        let mut schedule = format!("You have {} meeting", briefing.calendar_events.len());
        if briefing.calendar_events.len() != 1 {
            schedule.push('s');
        }
        schedule.push_str(" today: ");
        let lines: Vec<String> = briefing
            .calendar_events
            .iter()
            .map(|e| {
                let title = e.summary.as_deref().unwrap_or("an untitled event");
                match e.start_time {
                    Some(start) => format!("{title} at {}", start.with_timezone(&Local).format("%H:%M")),
                    None => title.to_string(),
                }
            })
            .collect();
        schedule.push_str(&lines.join(", "));
        schedule.push('.');
        parts.push(schedule);
    }

    if !briefing.priority_emails.is_empty() {
        parts.push(format!(
            "{} priority email{} need your attention.",
            briefing.priority_emails.len(),
            if briefing.priority_emails.len() == 1 { "" } else { "s" }
        ));
    }

    if !briefing.pending_promises.is_empty() {
        parts.push(format!(
            "{} commitment{} look overdue.",
            briefing.pending_promises.len(),
            if briefing.pending_promises.len() == 1 { "" } else { "s" }
        ));
    }

    if !briefing.unfinished_business.is_empty() {
        parts.push(format!(
            "There {} {} unfinished thread{} worth revisiting.",
            if briefing.unfinished_business.len() == 1 { "is" } else { "are" },
            briefing.unfinished_business.len(),
            if briefing.unfinished_business.len() == 1 { "" } else { "s" }
        ));
    }

    let overnight_total: usize = briefing.overnight_summary.iter().map(|h| h.capture_count).sum();
    if overnight_total > 0 {
        parts.push(format!(
            "Overnight activity included {overnight_total} captured screen{}.",
            if overnight_total == 1 { "" } else { "s" }
        ));
    }

    if !briefing.external_tasks.is_empty() {
        parts.push(format!("{} task{} are tracked externally.", briefing.external_tasks.len(), if briefing.external_tasks.len() == 1 { "" } else { "s" }));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jarvis_enrich::db::init_db as init_patterns_db;
    use jarvis_enrich::patterns::replace_active_cohort;
    use jarvis_memory::vectorstore::{ScrolledPoint, VectorRecord};
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct FakeStore {
        points: Vec<ScrolledPoint>,
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        async fn ensure_collection(&self, _name: &str) -> jarvis_memory::Result<()> {
            Ok(())
        }
        async fn upsert(&self, _collection: &str, _records: Vec<VectorRecord>) -> jarvis_memory::Result<()> {
            Ok(())
        }
        async fn scroll_payloads(&self, _collection: &str) -> jarvis_memory::Result<Vec<ScrolledPoint>> {
            Ok(self.points.clone())
        }
    }

    #[test]
    fn overnight_window_spans_previous_night() {
        let today: NaiveDate = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let (start, end) = overnight_window(today);
        assert!(start < end);
        assert_eq!((end - start).num_hours(), 10);
    }

    #[tokio::test]
    async fn overnight_summary_buckets_screen_chunks_by_hour() {
        let window_start = Utc.with_ymd_and_hms(2026, 7, 31, 20, 0, 0).unwrap();
        let window_end = Utc.with_ymd_and_hms(2026, 8, 1, 6, 0, 0).unwrap();

        let points = vec![
            ScrolledPoint {
                id: "1".to_string(),
                payload: json!({
                    "source": "screen",
                    "timestamp": "2026-07-31T22:15:00Z",
                    "projects": ["jarvis"],
                }),
            },
            ScrolledPoint {
                id: "2".to_string(),
                payload: json!({
                    "source": "screen",
                    "timestamp": "2026-07-31T22:45:00Z",
                    "projects": ["jarvis"],
                }),
            },
            ScrolledPoint {
                id: "3".to_string(),
                payload: json!({
                    "source": "chatgpt",
                    "timestamp": "2026-07-31T22:45:00Z",
                }),
            },
        ];

        let summary = overnight_capture_summary(&FakeStore { points }, window_start, window_end)
            .await
            .unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].capture_count, 2);
        assert_eq!(summary[0].top_projects, vec!["jarvis".to_string()]);
    }

    #[tokio::test]
    async fn composes_briefing_with_no_meetings_renders_fallback_line() {
        let conn = Connection::open_in_memory().unwrap();
        init_patterns_db(&conn).unwrap();
        let wrapped = Mutex::new(conn);
        replace_active_cohort(&wrapped, &[]).unwrap();
        let conn = wrapped.into_inner().unwrap();

        let store = FakeStore { points: vec![] };
        let now_local = Local.with_ymd_and_hms(2026, 8, 1, 7, 0, 0).unwrap();

        let briefing = compose_morning_briefing(
            &crate::collaborators::NullCalendarSource,
            &crate::collaborators::NullEmailSource,
            &store,
            &conn,
            vec![],
            now_local,
        )
        .await
        .unwrap();

        assert!(briefing.calendar_events.is_empty());
        let spoken = render_spoken(&briefing);
        assert!(spoken.contains("no meetings scheduled today"));
    }

    #[test]
    fn render_spoken_mentions_overdue_promises() {
        let briefing = MorningBriefing {
            date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            calendar_events: vec![],
            priority_emails: vec![],
            unfinished_business: vec![],
            pending_promises: vec![DetectedPattern {
                id: Uuid::nil(),
                pattern_type: PatternType::BrokenPromise,
                pattern_key: "alice".to_string(),
                description: "desc".to_string(),
                frequency: 1,
                first_seen: Utc::now(),
                last_seen: Utc::now(),
                suggested_action: None,
                conversation_ids: vec![],
                detected_at: Utc::now(),
                status: jarvis_core::types::PatternStatus::Active,
            }],
            pattern_alerts: vec![],
            overnight_summary: vec![],
            external_tasks: vec![],
        };
        assert!(render_spoken(&briefing).contains("commitment"));
    }
}
