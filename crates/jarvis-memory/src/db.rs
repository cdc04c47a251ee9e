use rusqlite::Connection;

use crate::error::Result;

/// Initialise the memory tables: imported conversations, derived chunks,
/// and the entity classification cache (§4.4-§4.7). Safe to call on every
/// startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_captures_table(conn)?;
    create_conversations_table(conn)?;
    create_chunks_table(conn)?;
    create_entity_classifications_table(conn)?;
    Ok(())
}

fn create_captures_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS captures (
            id            TEXT PRIMARY KEY,
            filepath      TEXT NOT NULL,
            timestamp     TEXT NOT NULL,
            monitor_index INTEGER NOT NULL DEFAULT 0,
            width         INTEGER NOT NULL,
            height        INTEGER NOT NULL,
            file_size     INTEGER NOT NULL,
            ocr_text      TEXT,
            status        TEXT NOT NULL DEFAULT 'stored',
            created_at    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_captures_timestamp
            ON captures(timestamp);",
    )?;
    Ok(())
}

fn create_conversations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS conversations (
            id          TEXT PRIMARY KEY,
            external_id TEXT NOT NULL,
            source      TEXT NOT NULL,
            title       TEXT NOT NULL,
            full_text   TEXT NOT NULL,
            message_count INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT,
            imported_at TEXT NOT NULL,
            processing_status TEXT NOT NULL DEFAULT 'pending',
            UNIQUE (external_id, source)
        );
        CREATE INDEX IF NOT EXISTS idx_conversations_source
            ON conversations(source);",
    )?;
    Ok(())
}

fn create_chunks_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS chunks (
            id              TEXT PRIMARY KEY,
            source_type     TEXT NOT NULL,
            source_id       TEXT NOT NULL,
            chunk_index     INTEGER NOT NULL,
            text            TEXT NOT NULL,
            timestamp       TEXT NOT NULL,
            people          TEXT NOT NULL DEFAULT '[]',
            projects        TEXT NOT NULL DEFAULT '[]',
            decisions       TEXT NOT NULL DEFAULT '[]',
            action_items    TEXT NOT NULL DEFAULT '[]',
            topics          TEXT NOT NULL DEFAULT '[]',
            dates_mentioned TEXT NOT NULL DEFAULT '[]',
            sentiment       TEXT NOT NULL DEFAULT 'neutral',
            indexed_at      TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_chunks_source
            ON chunks(source_type, source_id);
        CREATE INDEX IF NOT EXISTS idx_chunks_timestamp
            ON chunks(timestamp);",
    )?;
    Ok(())
}

fn create_entity_classifications_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS entity_classifications (
            name         TEXT NOT NULL,
            entity_type  TEXT NOT NULL,
            confidence   REAL NOT NULL DEFAULT 0.5,
            source       TEXT NOT NULL DEFAULT 'heuristic',
            classified_at TEXT NOT NULL,
            PRIMARY KEY (name)
        );",
    )?;
    Ok(())
}
