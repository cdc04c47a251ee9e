use std::str::FromStr;

use chrono::{DateTime, Utc};
use jarvis_core::types::{DetectedPattern, PatternStatus, PatternType};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::error::Result;

/// Initialise the `detected_patterns` table (§3, §8). Safe to call on
/// every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS detected_patterns (
            id                TEXT PRIMARY KEY,
            pattern_type      TEXT NOT NULL,
            pattern_key       TEXT NOT NULL,
            description       TEXT NOT NULL,
            frequency         INTEGER NOT NULL,
            first_seen        TEXT NOT NULL,
            last_seen         TEXT NOT NULL,
            suggested_action  TEXT,
            conversation_ids  TEXT NOT NULL DEFAULT '[]',
            detected_at       TEXT NOT NULL,
            status            TEXT NOT NULL DEFAULT 'active'
        );
        CREATE INDEX IF NOT EXISTS idx_detected_patterns_status
            ON detected_patterns(status);",
    )?;
    Ok(())
}

fn row_to_pattern(row: &Row) -> rusqlite::Result<DetectedPattern> {
    let id: String = row.get("id")?;
    let pattern_type: String = row.get("pattern_type")?;
    let first_seen: String = row.get("first_seen")?;
    let last_seen: String = row.get("last_seen")?;
    let detected_at: String = row.get("detected_at")?;
    let status: String = row.get("status")?;
    let conversation_ids: String = row.get("conversation_ids")?;

    let parse_ts = |s: &str| -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    };

    Ok(DetectedPattern {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        pattern_type: PatternType::from_str(&pattern_type).unwrap_or(PatternType::RecurringTheme),
        pattern_key: row.get("pattern_key")?,
        description: row.get("description")?,
        frequency: row.get("frequency")?,
        first_seen: parse_ts(&first_seen),
        last_seen: parse_ts(&last_seen),
        suggested_action: row.get("suggested_action")?,
        conversation_ids: serde_json::from_str::<Vec<String>>(&conversation_ids)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| Uuid::parse_str(&id).ok())
            .collect(),
        detected_at: parse_ts(&detected_at),
        status: PatternStatus::from_str(&status).unwrap_or(PatternStatus::Active),
    })
}

/// All currently-active patterns, most recently seen first. Used by
/// `jarvis-briefing`'s morning/meeting composers to surface pattern
/// alerts without duplicating the detectors' read path.
pub fn active_patterns(conn: &Connection) -> Result<Vec<DetectedPattern>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM detected_patterns WHERE status = 'active' ORDER BY last_seen DESC",
    )?;
    let rows = stmt.query_map([], row_to_pattern)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Active patterns restricted to the given kinds, preserving the same
/// most-recent-first order.
pub fn active_patterns_by_type(conn: &Connection, kinds: &[PatternType]) -> Result<Vec<DetectedPattern>> {
    Ok(active_patterns(conn)?
        .into_iter()
        .filter(|p| kinds.contains(&p.pattern_type))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::replace_active_cohort;
    use std::sync::Mutex;

    fn sample(kind: PatternType, status: PatternStatus) -> DetectedPattern {
        DetectedPattern {
            id: Uuid::new_v4(),
            pattern_type: kind,
            pattern_key: "alice".to_string(),
            description: "desc".to_string(),
            frequency: 5,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
            suggested_action: None,
            conversation_ids: vec![],
            detected_at: Utc::now(),
            status,
        }
    }

    #[test]
    fn active_patterns_by_type_filters_and_excludes_dismissed() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();

        let person = sample(PatternType::RecurringPerson, PatternStatus::Active);
        let project = sample(PatternType::StaleProject, PatternStatus::Active);
        let wrapped = Mutex::new(conn);
        replace_active_cohort(&wrapped, &[person, project]).unwrap();

        let conn = wrapped.into_inner().unwrap();
        let people_only = active_patterns_by_type(&conn, &[PatternType::RecurringPerson]).unwrap();
        assert_eq!(people_only.len(), 1);
        assert_eq!(people_only[0].pattern_type, PatternType::RecurringPerson);

        let all_active = active_patterns(&conn).unwrap();
        assert_eq!(all_active.len(), 2);
    }
}
