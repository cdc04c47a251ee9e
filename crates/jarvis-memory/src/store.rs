use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use jarvis_core::types::{
    Capture, CaptureStatus, ChunkTags, ClassificationSource, Conversation, ConversationSource,
    EntityClassification, EntityType,
};

use crate::db::init_db;
use crate::error::Result;

/// A normalized conversation ready for chunking, independent of which
/// export format it was parsed from (§4.3 "Supplemented").
#[derive(Debug, Clone)]
pub struct NormalizedConversation {
    pub external_id: String,
    pub source: String,
    pub title: String,
    pub full_text: String,
    pub message_count: i64,
    pub created_at: Option<chrono::DateTime<Utc>>,
}

/// Relational persistence for imported conversations, derived chunk tags,
/// and the entity classification cache (§4.3, §4.9). Vectors themselves
/// live in the vector store; this is metadata and dedup bookkeeping.
pub struct MemoryStore {
    conn: Mutex<Connection>,
}

impl MemoryStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Persist a newly uploaded capture's metadata row (§4.3: "the server
    /// persists bytes + metadata, enqueues processing"). The image bytes
    /// themselves are written to `filepath` by the caller before this is
    /// called; on a database failure the caller is expected to delete that
    /// file (the "compensating delete" scope guard named in §4.3).
    pub fn insert_capture(&self, capture: &Capture) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO captures
             (id, filepath, timestamp, monitor_index, width, height, file_size, ocr_text, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?3)",
            params![
                capture.id.to_string(),
                capture.filepath,
                capture.timestamp.to_rfc3339(),
                capture.monitor_index,
                capture.width,
                capture.height,
                capture.byte_size,
                capture.ocr_text,
                capture.status.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Fetch one capture's metadata row by id.
    pub fn get_capture(&self, id: Uuid) -> Result<Option<Capture>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, filepath, timestamp, monitor_index, width, height, file_size, ocr_text, status
             FROM captures WHERE id = ?1",
            params![id.to_string()],
            row_to_capture,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Transition a capture's status (§4.3: "exclusive write on a single
    /// Capture row from mark processing to mark completed|failed"),
    /// optionally attaching the OCR text extracted in between.
    pub fn set_capture_status(&self, id: Uuid, status: CaptureStatus, ocr_text: Option<&str>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE captures SET status = ?1, ocr_text = COALESCE(?2, ocr_text) WHERE id = ?3",
            params![status.to_string(), ocr_text, id.to_string()],
        )?;
        Ok(())
    }

    /// Captures in a given status, oldest first, capped at `limit` —
    /// `ProcessBacklog`'s read path (§4.13).
    pub fn captures_by_status(&self, status: CaptureStatus, limit: i64) -> Result<Vec<Capture>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, filepath, timestamp, monitor_index, width, height, file_size, ocr_text, status
             FROM captures WHERE status = ?1 ORDER BY timestamp ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![status.to_string(), limit], row_to_capture)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Insert a conversation, deduplicating by (external_id, source).
    /// Returns the row's id and `true` if this was a new row, or the
    /// existing row's id and `false` if it already existed (the
    /// idempotent-ingest invariant in §8).
    pub fn insert_conversation(&self, conv: &NormalizedConversation) -> Result<(Uuid, bool)> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let created_at = conv.created_at.map(|d| d.to_rfc3339());
        let id = Uuid::new_v4();
        let changed = conn.execute(
            "INSERT OR IGNORE INTO conversations
             (id, external_id, source, title, full_text, message_count, created_at, imported_at, processing_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending')",
            params![id.to_string(), conv.external_id, conv.source, conv.title, conv.full_text, conv.message_count, created_at, now],
        )?;
        if changed > 0 {
            return Ok((id, true));
        }
        let existing_id: String = conn.query_row(
            "SELECT id FROM conversations WHERE external_id = ?1 AND source = ?2",
            params![conv.external_id, conv.source],
            |row| row.get(0),
        )?;
        Ok((existing_id.parse().unwrap_or(id), false))
    }

    /// Fetch one conversation by id, for `GET /why/conversation/{id}`.
    pub fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, external_id, source, title, full_text, message_count,
                    created_at, imported_at, processing_status
             FROM conversations WHERE id = ?1",
            params![id.to_string()],
            row_to_conversation,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Mark a conversation as chunked/embedded, the ingest pipeline's
    /// counterpart to [`MemoryStore::set_capture_status`].
    pub fn set_conversation_status(&self, id: Uuid, status: CaptureStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE conversations SET processing_status = ?1 WHERE id = ?2",
            params![status.to_string(), id.to_string()],
        )?;
        Ok(())
    }

    /// Persist one chunk's text and derived tags, keyed by a deterministic
    /// point id (C4a/C4b storage path; vector upsert happens separately
    /// against the same id).
    pub fn store_chunk(
        &self,
        point_id: Uuid,
        source_type: &str,
        source_id: &str,
        chunk_index: i32,
        text: &str,
        timestamp: chrono::DateTime<Utc>,
        tags: &ChunkTags,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO chunks
             (id, source_type, source_id, chunk_index, text, timestamp,
              people, projects, decisions, action_items, topics, dates_mentioned,
              sentiment, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                point_id.to_string(),
                source_type,
                source_id,
                chunk_index,
                text,
                timestamp.to_rfc3339(),
                serde_json::to_string(&tags.people)?,
                serde_json::to_string(&tags.projects)?,
                serde_json::to_string(&tags.decisions)?,
                serde_json::to_string(&tags.action_items)?,
                serde_json::to_string(&tags.topics)?,
                serde_json::to_string(&tags.dates_mentioned)?,
                tags.sentiment.map(|s| s.to_string()).unwrap_or_else(|| "neutral".to_string()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Read a cached entity classification, if one exists.
    pub fn get_entity_classification(&self, name: &str) -> Result<Option<EntityClassification>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT entity_type, source, classified_at FROM entity_classifications WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        Ok(row.map(|(entity_type, source, classified_at)| EntityClassification {
            entity_name: name.to_string(),
            entity_type: entity_type.parse().unwrap_or(EntityType::Noise),
            source: source.parse().unwrap_or(ClassificationSource::Heuristic),
            classified_at: chrono::DateTime::parse_from_rfc3339(&classified_at)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }))
    }

    /// Upsert an entity classification (§3: carries `source` so a later
    /// LLM-backed reclassification can tell it apart from a degraded
    /// heuristic answer already cached).
    pub fn put_entity_classification(&self, classification: &EntityClassification) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO entity_classifications (name, entity_type, confidence, source, classified_at)
             VALUES (?1, ?2, 0.5, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
               entity_type = excluded.entity_type,
               source = excluded.source,
               classified_at = excluded.classified_at",
            params![
                classification.entity_name,
                classification.entity_type.to_string(),
                classification.source.to_string(),
                classification.classified_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn row_to_capture(row: &rusqlite::Row<'_>) -> rusqlite::Result<Capture> {
    let id: String = row.get(0)?;
    let timestamp: String = row.get(2)?;
    let status: String = row.get(8)?;
    Ok(Capture {
        id: id.parse().unwrap_or_else(|_| Uuid::nil()),
        filepath: row.get(1)?,
        timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        monitor_index: row.get(3)?,
        width: row.get(4)?,
        height: row.get(5)?,
        byte_size: row.get(6)?,
        ocr_text: row.get(7)?,
        status: status.parse().unwrap_or(CaptureStatus::Pending),
    })
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let id: String = row.get(0)?;
    let source: String = row.get(2)?;
    let created_at: Option<String> = row.get(6)?;
    let imported_at: String = row.get(7)?;
    let processing_status: String = row.get(8)?;
    let parse_ts = |s: &str| -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    };
    Ok(Conversation {
        id: id.parse().unwrap_or_else(|_| Uuid::nil()),
        external_id: row.get(1)?,
        source: source.parse().unwrap_or(ConversationSource::Screen),
        title: row.get(3)?,
        full_text: row.get(4)?,
        message_count: row.get(5)?,
        conversation_date: created_at.as_deref().map(parse_ts),
        imported_at: parse_ts(&imported_at),
        processing_status: processing_status.parse().unwrap_or(CaptureStatus::Pending),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_capture(id: Uuid) -> Capture {
        Capture {
            id,
            filepath: format!("/captures/{id}.jpg"),
            timestamp: Utc::now(),
            monitor_index: 0,
            width: 1920,
            height: 1080,
            byte_size: 204_800,
            ocr_text: None,
            status: CaptureStatus::Pending,
        }
    }

    #[test]
    fn capture_roundtrips_and_status_transitions() {
        let store = MemoryStore::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        let capture = sample_capture(id);
        store.insert_capture(&capture).unwrap();

        let fetched = store.get_capture(id).unwrap().unwrap();
        assert_eq!(fetched.status, CaptureStatus::Pending);
        assert!(fetched.ocr_text.is_none());

        store.set_capture_status(id, CaptureStatus::Processing, None).unwrap();
        store.set_capture_status(id, CaptureStatus::Completed, Some("extracted text")).unwrap();

        let fetched = store.get_capture(id).unwrap().unwrap();
        assert_eq!(fetched.status, CaptureStatus::Completed);
        assert_eq!(fetched.ocr_text.as_deref(), Some("extracted text"));
    }

    #[test]
    fn unknown_capture_returns_none() {
        let store = MemoryStore::open_in_memory().unwrap();
        assert!(store.get_capture(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn duplicate_import_is_idempotent() {
        let store = MemoryStore::open_in_memory().unwrap();
        let conv = NormalizedConversation {
            external_id: "abc123".to_string(),
            source: "chatgpt".to_string(),
            title: "Test".to_string(),
            full_text: "hello world".to_string(),
            message_count: 2,
            created_at: None,
        };
        let (id1, fresh1) = store.insert_conversation(&conv).unwrap();
        let (id2, fresh2) = store.insert_conversation(&conv).unwrap();
        assert!(fresh1);
        assert!(!fresh2);
        assert_eq!(id1, id2);

        let fetched = store.get_conversation(id1).unwrap().unwrap();
        assert_eq!(fetched.processing_status, CaptureStatus::Pending);
        store.set_conversation_status(id1, CaptureStatus::Completed).unwrap();
        assert_eq!(store.get_conversation(id1).unwrap().unwrap().processing_status, CaptureStatus::Completed);
    }

    #[test]
    fn entity_classification_roundtrips() {
        let store = MemoryStore::open_in_memory().unwrap();
        let classification = EntityClassification {
            entity_name: "Jane Doe".to_string(),
            entity_type: EntityType::Person,
            source: ClassificationSource::Llm,
            classified_at: Utc::now(),
        };
        store.put_entity_classification(&classification).unwrap();
        let fetched = store.get_entity_classification("Jane Doe").unwrap().unwrap();
        assert_eq!(fetched.entity_type, EntityType::Person);
        assert_eq!(fetched.source, ClassificationSource::Llm);
    }

    #[test]
    fn unknown_entity_returns_none() {
        let store = MemoryStore::open_in_memory().unwrap();
        assert!(store.get_entity_classification("nobody").unwrap().is_none());
    }
}
