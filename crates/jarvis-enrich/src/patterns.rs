//! Recurring-theme pattern detection over memory chunks, ported from
//! `original_source/server/src/jarvis_server/patterns/conversation_detector.py`.
//! Both the heuristic and LLM-assisted variants share a single
//! transactional cohort-replacement write (old active patterns are
//! dismissed, new ones inserted, in one `rusqlite` transaction).

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use jarvis_core::types::{DetectedPattern, PatternStatus, PatternType};
use jarvis_core::LlmBackend;
use jarvis_memory::vectorstore::{VectorStore, MEMORY_CHUNKS_COLLECTION};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::Result;

/// Exact commitment-phrase list from the original detector, used to spot
/// unresolved "I'll do X" style promises.
pub const COMMITMENT_PHRASES: &[&str] = &[
    "i'll do",
    "i'll follow up",
    "let's follow up",
    "next week we should",
    "i'll get back to you",
    "i'll send",
    "i'll share",
    "i'll check",
    "i'll look into",
    "i'll reach out",
    "remind me to",
    "todo:",
    "need to do",
];

const RECURRING_PERSON_THRESHOLD: u32 = 5;
const RECURRING_TOPIC_THRESHOLD: u32 = 10;
const STALE_PROJECT_THRESHOLD: u32 = 5;
const BROKEN_PROMISE_DAYS: i64 = 7;
const STALE_DAYS: i64 = 30;

#[derive(Default)]
struct MentionTracker {
    count: u32,
    conversations: Vec<Uuid>,
    dates: Vec<DateTime<Utc>>,
}

struct Commitment {
    text: String,
    conversation_id: Option<Uuid>,
    date: Option<DateTime<Utc>>,
    phrase: &'static str,
}

struct ScanData {
    people: HashMap<String, MentionTracker>,
    topics: HashMap<String, MentionTracker>,
    projects: HashMap<String, MentionTracker>,
    commitments: Vec<Commitment>,
}

async fn scan_memory_chunks(store: &dyn VectorStore) -> Result<ScanData> {
    let points = store.scroll_payloads(MEMORY_CHUNKS_COLLECTION).await?;

    let mut people: HashMap<String, MentionTracker> = HashMap::new();
    let mut topics: HashMap<String, MentionTracker> = HashMap::new();
    let mut projects: HashMap<String, MentionTracker> = HashMap::new();
    let mut commitments = Vec::new();

    for point in &points {
        let conversation_id = point
            .payload
            .get("conversation_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let chunk_text = point.payload.get("chunk_text").or_else(|| point.payload.get("text")).and_then(|v| v.as_str()).unwrap_or("").to_lowercase();
        let chunk_date = point
            .payload
            .get("conversation_date")
            .or_else(|| point.payload.get("timestamp"))
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00")).ok())
            .map(|d| d.with_timezone(&Utc));

        track(&mut people, &point.payload, "people", conversation_id, chunk_date);
        track(&mut topics, &point.payload, "topics", conversation_id, chunk_date);
        track(&mut projects, &point.payload, "projects", conversation_id, chunk_date);

        for phrase in COMMITMENT_PHRASES {
            if chunk_text.contains(phrase) {
                commitments.push(Commitment {
                    text: chunk_text.chars().take(200).collect(),
                    conversation_id,
                    date: chunk_date,
                    phrase,
                });
            }
        }
    }

    Ok(ScanData { people, topics, projects, commitments })
}

fn track(
    tracker: &mut HashMap<String, MentionTracker>,
    payload: &serde_json::Value,
    key: &str,
    conversation_id: Option<Uuid>,
    chunk_date: Option<DateTime<Utc>>,
) {
    let Some(items) = payload.get(key).and_then(|v| v.as_array()) else { return };
    for item in items {
        let Some(name) = item.as_str() else { continue };
        let entry = tracker.entry(name.to_string()).or_default();
        entry.count += 1;
        if let Some(cid) = conversation_id {
            entry.conversations.push(cid);
        }
        if let Some(d) = chunk_date {
            entry.dates.push(d);
        }
    }
}

/// Pure heuristic detector: four pattern kinds, exact thresholds from the
/// original (5/10/5/7-days).
pub async fn detect_heuristic(store: &dyn VectorStore) -> Result<Vec<DetectedPattern>> {
    let scan = scan_memory_chunks(store).await?;
    let now = Utc::now();
    let thirty_days_ago = now - chrono::Duration::days(STALE_DAYS);
    let seven_days_ago = now - chrono::Duration::days(BROKEN_PROMISE_DAYS);
    let mut patterns = Vec::new();

    for (person, data) in &scan.people {
        if data.count < RECURRING_PERSON_THRESHOLD {
            continue;
        }
        let mut dates = data.dates.clone();
        dates.sort();
        let first_seen = dates.first().copied().unwrap_or(now);
        let last_seen = dates.last().copied().unwrap_or(now);
        let is_stale = !dates.is_empty() && last_seen < thirty_days_ago;

        patterns.push(DetectedPattern {
            id: Uuid::new_v4(),
            pattern_type: if is_stale { PatternType::StalePerson } else { PatternType::RecurringPerson },
            pattern_key: person.clone(),
            description: format!(
                "{person} mentioned {} times across {} conversations",
                data.count,
                unique_count(&data.conversations)
            ),
            frequency: data.count as i32,
            first_seen,
            last_seen,
            suggested_action: Some(if is_stale { format!("Reach out to {person}") } else { format!("Keep in touch with {person}") }),
            conversation_ids: dedup_limit(&data.conversations, 20),
            detected_at: now,
            status: PatternStatus::Active,
        });
    }

    for (topic, data) in &scan.topics {
        if data.count < RECURRING_TOPIC_THRESHOLD {
            continue;
        }
        let mut dates = data.dates.clone();
        dates.sort();
        let first_seen = dates.first().copied().unwrap_or(now);
        let last_seen = dates.last().copied().unwrap_or(now);
        let is_stale = !dates.is_empty() && last_seen < thirty_days_ago;

        patterns.push(DetectedPattern {
            id: Uuid::new_v4(),
            pattern_type: if is_stale { PatternType::UnfinishedBusiness } else { PatternType::RecurringTopic },
            pattern_key: topic.clone(),
            description: format!(
                "'{topic}' discussed {} times across {} conversations",
                data.count,
                unique_count(&data.conversations)
            ),
            frequency: data.count as i32,
            first_seen,
            last_seen,
            suggested_action: Some(if is_stale { format!("Review status of {topic}") } else { format!("Actively discussing {topic}") }),
            conversation_ids: dedup_limit(&data.conversations, 20),
            detected_at: now,
            status: PatternStatus::Active,
        });
    }

    for (project, data) in &scan.projects {
        if data.count < STALE_PROJECT_THRESHOLD {
            continue;
        }
        let mut dates = data.dates.clone();
        dates.sort();
        let first_seen = dates.first().copied().unwrap_or(now);
        let last_seen = dates.last().copied().unwrap_or(now);
        let is_stale = !dates.is_empty() && last_seen < thirty_days_ago;
        if !is_stale {
            continue;
        }

        patterns.push(DetectedPattern {
            id: Uuid::new_v4(),
            pattern_type: PatternType::StaleProject,
            pattern_key: project.clone(),
            description: format!("Project '{project}' was discussed {} times but hasn't been mentioned in 30+ days", data.count),
            frequency: data.count as i32,
            first_seen,
            last_seen,
            suggested_action: Some(format!("Check status of {project} - may need follow-up")),
            conversation_ids: dedup_limit(&data.conversations, 20),
            detected_at: now,
            status: PatternStatus::Active,
        });
    }

    for commitment in &scan.commitments {
        let Some(date) = commitment.date else { continue };
        if date >= seven_days_ago {
            continue;
        }
        let days_ago = (now - date).num_days();
        patterns.push(DetectedPattern {
            id: Uuid::new_v4(),
            pattern_type: PatternType::BrokenPromise,
            pattern_key: commitment.phrase.to_string(),
            description: format!("Commitment made {days_ago} days ago: '{}...'", commitment.text),
            frequency: 1,
            first_seen: date,
            last_seen: date,
            suggested_action: Some(format!("Follow up on commitment: '{}'", commitment.phrase)),
            conversation_ids: commitment.conversation_id.into_iter().collect(),
            detected_at: now,
            status: PatternStatus::Active,
        });
    }

    Ok(patterns)
}

fn unique_count(ids: &[Uuid]) -> usize {
    ids.iter().collect::<std::collections::HashSet<_>>().len()
}

fn dedup_limit(ids: &[Uuid], limit: usize) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().filter(|id| seen.insert(**id)).take(limit).copied().collect()
}

/// LLM-assisted variant: asks the model to name recurring themes in free
/// text, then maps its reported confidence to a frequency count via
/// `max(1, round(confidence * 10))`, floored at a confidence of 0.4.
pub async fn detect_llm(store: &dyn VectorStore, llm: &dyn LlmBackend) -> Result<Vec<DetectedPattern>> {
    let scan = scan_memory_chunks(store).await?;
    let now = Utc::now();

    let summary_input = scan
        .topics
        .keys()
        .chain(scan.people.keys())
        .chain(scan.projects.keys())
        .take(200)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let instructions = "Identify recurring themes, people, or unfinished business in this list of \
        frequently-mentioned names. Reply as lines of `name | confidence (0-1) | suggested action`.";

    let response = llm.summarize(&summary_input, instructions).await?;

    let mut patterns = Vec::new();
    for line in response.lines() {
        let parts: Vec<&str> = line.splitn(3, '|').map(str::trim).collect();
        let [name, confidence_str, action] = parts.as_slice() else { continue };
        let Ok(confidence) = confidence_str.parse::<f64>() else { continue };
        if confidence < 0.4 {
            continue;
        }
        let frequency = ((confidence * 10.0).round() as i32).max(1);

        patterns.push(DetectedPattern {
            id: Uuid::new_v4(),
            pattern_type: PatternType::RecurringTheme,
            pattern_key: name.to_string(),
            description: format!("'{name}' surfaced as a recurring theme (confidence {confidence:.2})"),
            frequency,
            first_seen: now,
            last_seen: now,
            suggested_action: Some(action.to_string()),
            conversation_ids: Vec::new(),
            detected_at: now,
            status: PatternStatus::Active,
        });
    }

    Ok(patterns)
}

/// Replace the active pattern cohort in one transaction: existing
/// `active` rows are dismissed, `patterns` are inserted fresh. Mirrors
/// the original's dismiss-then-insert sequence, made atomic.
pub fn replace_active_cohort(conn: &Mutex<Connection>, patterns: &[DetectedPattern]) -> Result<()> {
    let mut conn = conn.lock().expect("detected_patterns connection poisoned");
    let tx = conn.transaction()?;

    tx.execute("UPDATE detected_patterns SET status = 'dismissed' WHERE status = 'active'", [])?;

    for p in patterns {
        let conversation_ids = serde_json::to_string(&p.conversation_ids)?;
        tx.execute(
            "INSERT INTO detected_patterns
                (id, pattern_type, pattern_key, description, frequency, first_seen, last_seen,
                 suggested_action, conversation_ids, detected_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                p.id.to_string(),
                p.pattern_type.to_string(),
                p.pattern_key,
                p.description,
                p.frequency,
                p.first_seen.to_rfc3339(),
                p.last_seen.to_rfc3339(),
                p.suggested_action,
                conversation_ids,
                p.detected_at.to_rfc3339(),
                p.status.to_string(),
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_memory::vectorstore::{ScrolledPoint, VectorRecord};
    use serde_json::json;

    struct FakeStore {
        points: Vec<ScrolledPoint>,
    }

    #[async_trait::async_trait]
    impl VectorStore for FakeStore {
        async fn ensure_collection(&self, _name: &str) -> jarvis_memory::Result<()> {
            Ok(())
        }
        async fn upsert(&self, _collection: &str, _records: Vec<VectorRecord>) -> jarvis_memory::Result<()> {
            Ok(())
        }
        async fn scroll_payloads(&self, _collection: &str) -> jarvis_memory::Result<Vec<ScrolledPoint>> {
            Ok(self
                .points
                .iter()
                .map(|p| ScrolledPoint { id: p.id.clone(), payload: p.payload.clone() })
                .collect())
        }
    }

    fn point(people: Vec<&str>, date: &str) -> ScrolledPoint {
        ScrolledPoint {
            id: Uuid::new_v4().to_string(),
            payload: json!({
                "conversation_id": Uuid::new_v4().to_string(),
                "people": people,
                "topics": [],
                "projects": [],
                "chunk_text": "hello",
                "conversation_date": date,
            }),
        }
    }

    #[tokio::test]
    async fn recurring_person_requires_five_mentions() {
        let points: Vec<ScrolledPoint> = (0..5).map(|_| point(vec!["Sven"], "2026-07-01T00:00:00Z")).collect();
        let store = FakeStore { points };
        let patterns = detect_heuristic(&store).await.unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern_type, PatternType::RecurringPerson);
    }

    #[tokio::test]
    async fn below_threshold_produces_no_pattern() {
        let points: Vec<ScrolledPoint> = (0..4).map(|_| point(vec!["Sven"], "2026-07-01T00:00:00Z")).collect();
        let store = FakeStore { points };
        let patterns = detect_heuristic(&store).await.unwrap();
        assert!(patterns.is_empty());
    }

    #[tokio::test]
    async fn broken_promise_detected_from_commitment_phrase() {
        let mut p = point(vec![], "2026-06-01T00:00:00Z");
        p.payload["chunk_text"] = json!("i'll follow up next week on this");
        let store = FakeStore { points: vec![p] };
        let patterns = detect_heuristic(&store).await.unwrap();
        assert!(patterns.iter().any(|p| p.pattern_type == PatternType::BrokenPromise));
    }
}
