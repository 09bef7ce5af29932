//! Best-effort history persistence.
//!
//! The tracker can mirror its settled history through a [`HistoryStore`].
//! The mirror is a convenience, not a durability guarantee: runtime load
//! and save failures are swallowed (and logged) by the tracker, and the
//! mirror is never read back for correctness. Only construction fails
//! loudly.

use rusqlite::{Connection, params};
use tracing::warn;

use crate::error::Result;
use crate::model::{WorkId, WorkRecord, WorkStatus};

/// Injectable load/save hooks for settled history.
pub trait HistoryStore {
    /// Load previously mirrored records, oldest first.
    fn load(&mut self) -> Result<Vec<WorkRecord>>;

    /// Replace the mirror with the given snapshot (oldest first).
    fn save(&mut self, records: &[WorkRecord]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SQLite mirror
// ---------------------------------------------------------------------------

/// SQLite-backed history mirror. Owns the connection.
pub struct SqliteHistory {
    conn: Connection,
}

impl SqliteHistory {
    /// Open or create a mirror database at the given path.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Create an in-memory mirror (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS history (
                id          TEXT PRIMARY KEY,
                seq         INTEGER NOT NULL,
                work_type   TEXT NOT NULL,
                payload     TEXT NOT NULL DEFAULT 'null',
                status      TEXT NOT NULL,
                result      TEXT,
                error       TEXT,
                started_at  TEXT NOT NULL,
                ended_at    TEXT,
                duration_ms INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_history_seq ON history(seq);
            ",
        )?;
        Ok(())
    }

    /// Execute a closure within a SQLite transaction.
    ///
    /// The transaction commits if the closure returns Ok, rolls back on Err.
    fn with_transaction<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

impl HistoryStore for SqliteHistory {
    fn load(&mut self) -> Result<Vec<WorkRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM history ORDER BY seq ASC")?;

        let rows = stmt
            .query_map([], |row| Ok(row_to_record(row)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Rows that fail to parse are skipped, not fatal: the mirror is
        // best-effort and a corrupt row must not poison startup.
        let mut records = Vec::new();
        for row in rows {
            match row {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping unparseable history row"),
            }
        }
        Ok(records)
    }

    fn save(&mut self, records: &[WorkRecord]) -> Result<()> {
        self.with_transaction(|tx| {
            tx.execute("DELETE FROM history", [])?;
            for record in records {
                insert_record_on(tx, record)?;
            }
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn insert_record_on(conn: &Connection, record: &WorkRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO history (
            id, seq, work_type, payload, status, result, error,
            started_at, ended_at, duration_ms
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.id.0.to_string(),
            record.seq as i64,
            record.work_type,
            serde_json::to_string(&record.payload).unwrap_or_default(),
            record.status.to_string(),
            record
                .result
                .as_ref()
                .map(|v| serde_json::to_string(v).unwrap_or_default()),
            record.error,
            record.started_at.to_rfc3339(),
            record.ended_at.map(|t| t.to_rfc3339()),
            record.duration_ms.map(|d| d as i64),
        ],
    )?;
    Ok(())
}

fn row_to_record(row: &rusqlite::Row) -> std::result::Result<WorkRecord, String> {
    let id_str: String = row.get(0).map_err(|e| e.to_string())?;
    let payload_str: String = row.get(3).map_err(|e| e.to_string())?;
    let status_str: String = row.get(4).map_err(|e| e.to_string())?;
    let result_str: Option<String> = row.get(5).map_err(|e| e.to_string())?;
    let started_str: String = row.get(7).map_err(|e| e.to_string())?;
    let ended_str: Option<String> = row.get(8).map_err(|e| e.to_string())?;
    let duration: Option<i64> = row.get(9).map_err(|e| e.to_string())?;

    Ok(WorkRecord {
        id: WorkId(id_str.parse().map_err(|e: uuid::Error| e.to_string())?),
        seq: row.get::<_, i64>(1).map_err(|e| e.to_string())? as u64,
        work_type: row.get(2).map_err(|e| e.to_string())?,
        payload: serde_json::from_str(&payload_str).unwrap_or(serde_json::Value::Null),
        status: parse_status(&status_str)?,
        result: result_str.and_then(|s| serde_json::from_str(&s).ok()),
        error: row.get(6).map_err(|e| e.to_string())?,
        started_at: started_str
            .parse()
            .map_err(|_| "invalid started_at".to_string())?,
        ended_at: ended_str.and_then(|s| s.parse().ok()),
        duration_ms: duration.map(|d| d.max(0) as u64),
    })
}

fn parse_status(s: &str) -> std::result::Result<WorkStatus, String> {
    match s {
        "running" => Ok(WorkStatus::Running),
        "completed" => Ok(WorkStatus::Completed),
        "failed" => Ok(WorkStatus::Failed),
        "cancelled" => Ok(WorkStatus::Cancelled),
        _ => Err(format!("unknown status: {s}")),
    }
}
