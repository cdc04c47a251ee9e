use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use uuid::Uuid;

use jarvis_core::config::QueueConfig;

use crate::db::init_db;
use crate::error::{QueueError, Result};

/// A queued capture awaiting upload (§4.2).
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: String,
    pub filepath: String,
    pub metadata: Value,
    pub attempts: i64,
    pub status: String,
}

/// Aggregate counts by status, used for health checks and tests. A
/// completed upload has no row left to count (see [`UploadQueue::mark_completed`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: i64,
    pub uploading: i64,
    pub failed: i64,
    pub total: i64,
}

/// Persistent, retrying upload queue backed by SQLite (§4.2). Mirrors the
/// original agent's `sync/queue.py` state machine: pending -> uploading ->
/// deleted on success, with uploading -> pending on transient failure until
/// `max_attempts` is exceeded, at which point the item becomes failed.
pub struct UploadQueue {
    conn: Mutex<Connection>,
    max_attempts: i64,
    retry_backoff_s: i64,
}

impl UploadQueue {
    pub fn open(path: &str, config: &QueueConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_attempts: config.max_attempts as i64,
            retry_backoff_s: config.retry_backoff_s as i64,
        })
    }

    pub fn open_in_memory(config: &QueueConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_attempts: config.max_attempts as i64,
            retry_backoff_s: config.retry_backoff_s as i64,
        })
    }

    /// Add a capture to the queue with `pending` status.
    pub fn enqueue(&self, filepath: &str, metadata: &Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let metadata_json = serde_json::to_string(metadata)?;
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO upload_queue (id, filepath, metadata_json, created_at, attempts, status)
             VALUES (?1, ?2, ?3, ?4, 0, 'pending')",
            params![id, filepath, metadata_json, now],
        )?;
        Ok(id)
    }

    /// Fetch up to `limit` items eligible for upload, oldest first. An item
    /// that just failed is only eligible again once `retry_backoff_s` has
    /// elapsed since its last attempt (§4.2, `sync/queue.py::get_pending`).
    pub fn pending(&self, limit: i64) -> Result<Vec<QueueItem>> {
        let cutoff = (Utc::now() - chrono::Duration::seconds(self.retry_backoff_s)).to_rfc3339();
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, filepath, metadata_json, attempts, status
             FROM upload_queue
             WHERE status = 'pending' AND (last_attempt IS NULL OR last_attempt < ?1)
             ORDER BY created_at ASC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![cutoff, limit], |row| {
                let metadata_json: String = row.get(2)?;
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, metadata_json, row.get::<_, i64>(3)?, row.get::<_, String>(4)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, filepath, metadata_json, attempts, status)| {
                let metadata = serde_json::from_str(&metadata_json)?;
                Ok(QueueItem { id, filepath, metadata, attempts, status })
            })
            .collect()
    }

    pub fn mark_uploading(&self, id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE upload_queue SET status = 'uploading', last_attempt = ?1, attempts = attempts + 1
             WHERE id = ?2",
            params![now, id],
        )?;
        if updated == 0 {
            return Err(QueueError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// A successfully uploaded item is removed outright (§3: QueuedCapture
    /// is "deleted on success"; the status enum has no `completed` member).
    pub fn mark_completed(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM upload_queue WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(QueueError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Record a failed upload attempt. If `attempts` has reached
    /// `max_attempts`, the item moves to terminal `failed`; otherwise it
    /// reverts to `pending` so the worker retries it on its next pass.
    pub fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let attempts: i64 = conn
            .query_row("SELECT attempts FROM upload_queue WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?
            .ok_or_else(|| QueueError::NotFound { id: id.to_string() })?;

        let next_status = if attempts >= self.max_attempts { "failed" } else { "pending" };
        conn.execute(
            "UPDATE upload_queue SET status = ?1, error = ?2 WHERE id = ?3",
            params![next_status, error, id],
        )?;
        Ok(())
    }

    pub fn stats(&self) -> Result<QueueStats> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM upload_queue GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut stats = QueueStats::default();
        for row in rows {
            let (status, count) = row?;
            match status.as_str() {
                "pending" => stats.pending = count,
                "uploading" => stats.uploading = count,
                "failed" => stats.failed = count,
                _ => {}
            }
            stats.total += count;
        }
        Ok(stats)
    }

    /// Delete terminally failed items older than `days` days (§4.2
    /// retention; successful items never accumulate since `mark_completed`
    /// already removes their row).
    pub fn cleanup_old(&self, days: i64) -> Result<usize> {
        let cutoff = (Utc::now() - chrono::Duration::days(days)).to_rfc3339();
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM upload_queue WHERE status = 'failed' AND created_at < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueueConfig {
        QueueConfig::default()
    }

    #[test]
    fn enqueue_then_pending_roundtrip() {
        let q = UploadQueue::open_in_memory(&config()).unwrap();
        let id = q.enqueue("/tmp/shot.jpg", &serde_json::json!({"monitor": 0})).unwrap();
        let pending = q.pending(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert_eq!(pending[0].status, "pending");
    }

    #[test]
    fn retry_bookkeeping_reaches_terminal_failure() {
        let mut config = config();
        config.max_attempts = 3;
        let q = UploadQueue::open_in_memory(&config).unwrap();
        let id = q.enqueue("/tmp/shot.jpg", &serde_json::json!({})).unwrap();

        for _ in 0..3 {
            q.mark_uploading(&id).unwrap();
            q.mark_failed(&id, "upload timed out").unwrap();
        }

        let stats = q.stats().unwrap();
        assert_eq!(stats, QueueStats { pending: 0, uploading: 0, failed: 1, total: 1 });
        assert!(q.pending(10).unwrap().is_empty());
    }

    #[test]
    fn successful_upload_removes_the_row() {
        let q = UploadQueue::open_in_memory(&config()).unwrap();
        let id = q.enqueue("/tmp/shot.jpg", &serde_json::json!({})).unwrap();
        q.mark_uploading(&id).unwrap();
        q.mark_completed(&id).unwrap();

        let stats = q.stats().unwrap();
        assert_eq!(stats, QueueStats::default());
        assert!(q.mark_completed(&id).is_err());
    }

    #[test]
    fn just_failed_item_is_not_immediately_pending_again() {
        let mut config = config();
        config.retry_backoff_s = 3600;
        let q = UploadQueue::open_in_memory(&config).unwrap();
        let id = q.enqueue("/tmp/shot.jpg", &serde_json::json!({})).unwrap();

        q.mark_uploading(&id).unwrap();
        q.mark_failed(&id, "connection reset").unwrap();

        assert!(q.pending(10).unwrap().is_empty());
    }

    #[test]
    fn mark_failed_on_unknown_id_errors() {
        let q = UploadQueue::open_in_memory(&config()).unwrap();
        let err = q.mark_failed("does-not-exist", "oops").unwrap_err();
        assert!(matches!(err, QueueError::NotFound { .. }));
    }
}
