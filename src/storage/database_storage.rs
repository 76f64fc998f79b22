use std::net::IpAddr;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::error_handling::types::StorageError;
use crate::session_management::session::duration_between;
use crate::session_management::SessionStatus;
use crate::storage::storage_trait::Storage;
use crate::storage::types::{Session, SessionFilter};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        remote_addr TEXT NOT NULL,
        started_at TEXT NOT NULL,
        ended_at TEXT,
        duration_seconds REAL,
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL
    );";

const INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_sessions_remote_addr ON sessions (remote_addr, status);";

const SELECT_SESSIONS: &str =
    "SELECT id, remote_addr, started_at, ended_at, duration_seconds, status, created_at
     FROM sessions";

// Internal row mapping for sessions to avoid manual try_get
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i64,
    remote_addr: String,
    started_at: String,
    ended_at: Option<String>,
    duration_seconds: Option<f64>,
    status: String,
    created_at: String,
}

impl SessionRow {
    fn into_session(self) -> Result<Session, StorageError> {
        let id = self.id;
        let corrupt = |what: &str, value: &str| {
            StorageError::Corrupt(format!("session {}: bad {} `{}`", id, what, value))
        };
        Ok(Session {
            id,
            remote_addr: self
                .remote_addr
                .parse()
                .map_err(|_| corrupt("remote_addr", &self.remote_addr))?,
            started_at: parse_timestamp(&self.started_at)
                .ok_or_else(|| corrupt("started_at", &self.started_at))?,
            ended_at: match self.ended_at {
                Some(s) => Some(parse_timestamp(&s).ok_or_else(|| corrupt("ended_at", &s))?),
                None => None,
            },
            duration_seconds: self.duration_seconds,
            status: self.status.parse().map_err(|_| corrupt("status", &self.status))?,
            created_at: parse_timestamp(&self.created_at)
                .ok_or_else(|| corrupt("created_at", &self.created_at))?,
        })
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|d| d.with_timezone(&Utc))
}

/// SQLite-backed session store.
///
/// A single pooled connection is held for the process lifetime; the tracker
/// is the only writer.
pub struct DatabaseStorage {
    pool: Pool<Sqlite>,
}

impl DatabaseStorage {
    /// Opens (creating if needed) the database file at `path` and ensures the schema exists.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::WriteFailed(format!("create {}: {}", parent.display(), e))
                })?;
            }
        }

        let opts = SqliteConnectOptions::new()
            .filename(path_ref)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(StorageError::ConnectionFailed)?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        sqlx::query(INDEX)
            .execute(&pool)
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        info!("Session database ready at {}", path_ref.display());
        Ok(Self { pool })
    }

    /// Flushes and closes the underlying connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl Storage for DatabaseStorage {
    async fn create_session(
        &self,
        remote_addr: IpAddr,
        started_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let started = format_timestamp(started_at);
        let result = sqlx::query(
            "INSERT INTO sessions (remote_addr, started_at, status, created_at)
             VALUES (?1, ?2, ?3, ?2)",
        )
        .bind(remote_addr.to_string())
        .bind(&started)
        .bind(SessionStatus::Active.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        let id = result.last_insert_rowid();
        debug!("Inserted session row {} for {}", id, remote_addr);
        Ok(id)
    }

    async fn close_session(
        &self,
        id: i64,
        ended_at: DateTime<Utc>,
        duration_seconds: f64,
        status: SessionStatus,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE sessions
             SET ended_at = ?1, duration_seconds = ?2, status = ?3
             WHERE id = ?4 AND status = ?5",
        )
        .bind(format_timestamp(ended_at))
        .bind(duration_seconds)
        .bind(status.as_str())
        .bind(id)
        .bind(SessionStatus::Active.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StorageError::SessionNotActive(id));
        }
        Ok(())
    }

    async fn get_sessions(
        &self,
        filter: Option<SessionFilter>,
    ) -> Result<Vec<Session>, StorageError> {
        let mut sql = String::from(SELECT_SESSIONS);
        let mut clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();
        if let Some(f) = &filter {
            if let Some(addr) = f.remote_addr {
                clauses.push("remote_addr = ?");
                binds.push(addr.to_string());
            }
            if let Some(status) = f.status {
                clauses.push("status = ?");
                binds.push(status.as_str().into());
            }
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut q = sqlx::query_as::<_, SessionRow>(&sql);
        for b in &binds {
            q = q.bind(b);
        }
        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }

    async fn close_stale_sessions(
        &self,
        now: DateTime<Utc>,
        status: SessionStatus,
    ) -> Result<usize, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        let stale: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, started_at FROM sessions WHERE status = ?1 ORDER BY id ASC",
        )
        .bind(SessionStatus::Active.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StorageError::ReadFailed(e.to_string()))?;

        let ended = format_timestamp(now);
        let mut count = 0;
        for (id, raw_started_at) in stale {
            let Some(started_at) = parse_timestamp(&raw_started_at) else {
                warn!("Leaving session {} open: bad started_at `{}`", id, raw_started_at);
                continue;
            };
            sqlx::query(
                "UPDATE sessions SET ended_at = ?1, duration_seconds = ?2, status = ?3
                 WHERE id = ?4",
            )
            .bind(&ended)
            .bind(duration_between(started_at, now))
            .bind(status.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            count += 1;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(count)
    }
}
