//! Table definitions.

use rusqlite::Connection;

/// Create tables and indexes if they do not exist yet.
pub(crate) fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            project_id      TEXT PRIMARY KEY,
            secret_key_hash TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            email           TEXT
        );

        CREATE TABLE IF NOT EXISTS logs (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id      TEXT NOT NULL,
            uid             TEXT NOT NULL,
            event_type      TEXT NOT NULL,
            current_url     TEXT NOT NULL,
            referrer        TEXT,
            time_on_page    INTEGER NOT NULL DEFAULT 0,
            event_timestamp TEXT NOT NULL,
            data            TEXT NOT NULL,
            data_hash       TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            log_type        TEXT NOT NULL,
            UNIQUE (project_id, data_hash)
        );

        CREATE INDEX IF NOT EXISTS idx_logs_project_id ON logs (project_id);
        "#,
    )
}
