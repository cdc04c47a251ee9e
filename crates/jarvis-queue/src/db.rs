use rusqlite::Connection;

use crate::error::Result;

/// Initialise the upload-queue schema in `conn` (§4.2, §6). Matches the
/// original's `upload_queue` table and `(status, created_at)` composite
/// index exactly.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS upload_queue (
            id            TEXT    NOT NULL PRIMARY KEY,
            filepath      TEXT    NOT NULL,
            metadata_json TEXT    NOT NULL,
            created_at    TEXT    NOT NULL,
            attempts      INTEGER NOT NULL DEFAULT 0,
            last_attempt  TEXT,
            status        TEXT    NOT NULL DEFAULT 'pending',
            error         TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_queue_status_created
        ON upload_queue (status, created_at);
        ",
    )?;
    Ok(())
}
