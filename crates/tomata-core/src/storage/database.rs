//! SQLite-based session history and key-value state.
//!
//! Stores completed work/break sessions, aggregate statistics, and the
//! serialized engine plus pending reminders between CLI invocations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::session::{SessionKind, SessionRecord};

use super::data_dir;

/// Aggregate session statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub work_sessions: u64,
    pub total_focus_secs: u64,
    pub total_break_secs: u64,
    pub today_sessions: u64,
    pub today_focus_secs: u64,
    pub average_work_secs: u64,
}

impl Stats {
    /// Focus time as "2h 5m" / "45m".
    pub fn formatted_focus_time(&self) -> String {
        let hours = self.total_focus_secs / 3600;
        let minutes = (self.total_focus_secs % 3600) / 60;
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }
}

/// SQLite database at `~/.config/tomata/tomata.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (and migrate) the database, creating it if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, crate::error::CoreError> {
        Ok(Self::open_at(data_dir()?.join("tomata.db"))?)
    }

    /// Open (and migrate) a database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl Into<std::path::PathBuf>) -> Result<Self, DatabaseError> {
        let path = path.into();
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id            TEXT PRIMARY KEY,
                    kind          TEXT NOT NULL,
                    started_at    TEXT NOT NULL,
                    ended_at      TEXT NOT NULL,
                    completed     INTEGER NOT NULL DEFAULT 1,
                    duration_secs INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_ended_at ON sessions(ended_at);
                CREATE INDEX IF NOT EXISTS idx_sessions_kind ON sessions(kind);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Insert a completed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, record: &SessionRecord) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (id, kind, started_at, ended_at, completed, duration_secs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id.to_string(),
                record.kind.as_str(),
                record.started_at.to_rfc3339(),
                record.ended_at.to_rfc3339(),
                record.completed,
                record.duration_secs,
            ],
        )?;
        Ok(())
    }

    /// Most recent sessions, newest first.
    pub fn recent_sessions(&self, limit: u32) -> Result<Vec<SessionRecord>, DatabaseError> {
        self.query_sessions(
            "SELECT id, kind, started_at, ended_at, completed, duration_secs
             FROM sessions ORDER BY started_at DESC LIMIT ?1",
            params![limit],
        )
    }

    /// Sessions started within `[from, to]`, newest first.
    pub fn sessions_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        self.query_sessions(
            "SELECT id, kind, started_at, ended_at, completed, duration_secs
             FROM sessions
             WHERE started_at >= ?1 AND started_at <= ?2
             ORDER BY started_at DESC",
            params![from.to_rfc3339(), to.to_rfc3339()],
        )
    }

    fn query_sessions(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, kind, started_at, ended_at, completed, duration_secs) = row?;
            sessions.push(SessionRecord {
                id: Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
                kind: parse_kind(&kind)?,
                started_at: parse_timestamp(&started_at)?,
                ended_at: parse_timestamp(&ended_at)?,
                completed,
                duration_secs,
            });
        }
        Ok(sessions)
    }

    /// Aggregates for sessions completed today (UTC).
    pub fn stats_today(&self) -> Result<Stats, DatabaseError> {
        let mut stats = self.aggregate(Some(&today_floor()))?;
        stats.today_sessions = stats.work_sessions;
        stats.today_focus_secs = stats.total_focus_secs;
        Ok(stats)
    }

    /// All-time aggregates, with today's work counted separately.
    pub fn stats_all(&self) -> Result<Stats, DatabaseError> {
        let mut stats = self.aggregate(None)?;

        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM sessions
             WHERE kind = 'work' AND completed = 1 AND ended_at >= ?1",
        )?;
        let (count, secs) = stmt.query_row(params![today_floor()], |row| {
            Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?))
        })?;
        stats.today_sessions = count;
        stats.today_focus_secs = secs;

        Ok(stats)
    }

    fn aggregate(&self, since: Option<&str>) -> Result<Stats, DatabaseError> {
        let sql = match since {
            Some(_) => {
                "SELECT kind, COUNT(*), COALESCE(SUM(duration_secs), 0)
                 FROM sessions WHERE completed = 1 AND ended_at >= ?1
                 GROUP BY kind"
            }
            None => {
                "SELECT kind, COUNT(*), COALESCE(SUM(duration_secs), 0)
                 FROM sessions WHERE completed = 1
                 GROUP BY kind"
            }
        };
        let mut stmt = self.conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        };
        let rows = match since {
            Some(floor) => stmt.query_map(params![floor], map_row)?,
            None => stmt.query_map([], map_row)?,
        };

        let mut stats = Stats::default();
        for row in rows {
            let (kind, count, secs) = row?;
            stats.total_sessions += count;
            match kind.as_str() {
                "work" => {
                    stats.work_sessions += count;
                    stats.total_focus_secs += secs;
                }
                "break" => {
                    stats.total_break_secs += secs;
                }
                _ => {}
            }
        }
        if stats.work_sessions > 0 {
            stats.average_work_secs = stats.total_focus_secs / stats.work_sessions;
        }
        Ok(stats)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are fine.
    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn parse_kind(raw: &str) -> Result<SessionKind, DatabaseError> {
    match raw {
        "work" => Ok(SessionKind::Work),
        "break" => Ok(SessionKind::Break),
        other => Err(DatabaseError::QueryFailed(format!(
            "unknown session kind '{other}'"
        ))),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
}

/// Start of today (UTC) in the stored timestamp format.
fn today_floor() -> String {
    format!("{}T00:00:00+00:00", Utc::now().format("%Y-%m-%d"))
}
