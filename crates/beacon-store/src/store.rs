//! The query gateway over SQLite.

use std::path::Path;
use std::sync::Arc;

use beacon_core::{LogSink, NewLogEntry, TIME_ON_PAGE_CAP_MS};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::schema::init_schema;

/// A stored log entry, as returned to project owners and admin queries.
#[derive(Debug, Clone, Serialize)]
pub struct LogRow {
    pub id: i64,
    pub project_id: String,
    pub uid: String,
    pub event_type: String,
    pub current_url: String,
    pub referrer: Option<String>,
    pub time_on_page: i64,
    pub event_timestamp: String,
    pub data: String,
    pub data_hash: String,
    pub created_at: String,
    pub log_type: String,
}

/// One row of the admin project listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub created_at: String,
    /// URL of the project's most recent log entry, if any.
    pub sample_url: Option<String>,
}

/// SQLite-backed store shared across request handlers.
///
/// The connection is guarded by a mutex held only for the duration of a
/// single statement; SQLite serializes writers anyway, and every operation
/// here is one statement.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialize the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        tracing::info!(path = %path.as_ref().display(), "log store opened");
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> rusqlite::Result<()> {
        init_schema(&self.conn.lock())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Writes
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert a log row unless its `(project_id, data_hash)` key exists.
    ///
    /// Returns `true` when a new row was written. `created_at` is assigned
    /// here, server-side.
    pub fn insert_log_if_absent(&self, entry: &NewLogEntry) -> rusqlite::Result<bool> {
        let created_at = chrono::Utc::now().to_rfc3339();
        let changed = self.conn.lock().execute(
            r#"INSERT OR IGNORE INTO logs (
                project_id,
                uid,
                event_type,
                current_url,
                referrer,
                time_on_page,
                event_timestamp,
                data,
                data_hash,
                created_at,
                log_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                entry.project_id,
                entry.uid,
                entry.event_type,
                entry.current_url,
                entry.referrer,
                entry.time_on_page,
                entry.event_timestamp,
                entry.data,
                entry.data_hash,
                created_at,
                entry.log_type.as_str(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Register a project. Only the secret's digest is stored.
    pub fn create_project(
        &self,
        project_id: &str,
        secret_key_hash: &str,
        email: Option<&str>,
    ) -> rusqlite::Result<()> {
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn.lock().execute(
            "INSERT INTO projects (project_id, secret_key_hash, created_at, email)
             VALUES (?1, ?2, ?3, ?4)",
            params![project_id, secret_key_hash, created_at, email],
        )?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════════════

    /// Resolve a secret-key digest to its project id.
    pub fn project_id_for_secret_hash(
        &self,
        secret_key_hash: &str,
    ) -> rusqlite::Result<Option<String>> {
        self.conn
            .lock()
            .query_row(
                "SELECT project_id FROM projects WHERE secret_key_hash = ?1",
                params![secret_key_hash],
                |row| row.get(0),
            )
            .optional()
    }

    /// All log rows for one project, oldest first.
    pub fn logs_for_project(&self, project_id: &str) -> rusqlite::Result<Vec<LogRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, uid, event_type, current_url, referrer,
                    time_on_page, event_timestamp, data, data_hash, created_at, log_type
             FROM logs WHERE project_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok(LogRow {
                id: row.get(0)?,
                project_id: row.get(1)?,
                uid: row.get(2)?,
                event_type: row.get(3)?,
                current_url: row.get(4)?,
                referrer: row.get(5)?,
                time_on_page: row.get(6)?,
                event_timestamp: row.get(7)?,
                data: row.get(8)?,
                data_hash: row.get(9)?,
                created_at: row.get(10)?,
                log_type: row.get(11)?,
            })
        })?;
        rows.collect()
    }

    /// Admin listing: every project with the URL of its latest log entry.
    pub fn projects_with_sample_url(&self) -> rusqlite::Result<Vec<ProjectSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT p.project_id,
                    p.created_at,
                    (SELECT current_url FROM logs
                     WHERE project_id = p.project_id
                     ORDER BY id DESC LIMIT 1) AS sample_url
             FROM projects p
             ORDER BY p.created_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProjectSummary {
                project_id: row.get(0)?,
                created_at: row.get(1)?,
                sample_url: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Aggregates
    // ═══════════════════════════════════════════════════════════════════════

    /// Total time-on-page across all logs, with each row capped at
    /// [`TIME_ON_PAGE_CAP_MS`].
    pub fn adjusted_total_time(&self) -> rusqlite::Result<i64> {
        self.conn.lock().query_row(
            "SELECT COALESCE(SUM(
                 CASE WHEN time_on_page > ?1 THEN ?1 ELSE time_on_page END
             ), 0) FROM logs",
            params![TIME_ON_PAGE_CAP_MS],
            |row| row.get(0),
        )
    }

    /// Number of distinct hashed visitors across all logs.
    pub fn distinct_visitor_count(&self) -> rusqlite::Result<i64> {
        self.conn
            .lock()
            .query_row("SELECT COUNT(DISTINCT uid) FROM logs", [], |row| row.get(0))
    }

    /// Number of registered projects.
    pub fn project_count(&self) -> rusqlite::Result<i64> {
        self.conn
            .lock()
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
    }

    /// Number of distinct payload content hashes across all logs.
    pub fn distinct_build_count(&self) -> rusqlite::Result<i64> {
        self.conn
            .lock()
            .query_row("SELECT COUNT(DISTINCT data_hash) FROM logs", [], |row| {
                row.get(0)
            })
    }
}

impl LogSink for SqliteStore {
    type Error = rusqlite::Error;

    async fn insert_if_absent(&self, entry: &NewLogEntry) -> Result<bool, rusqlite::Error> {
        self.insert_log_if_absent(entry)
    }
}
