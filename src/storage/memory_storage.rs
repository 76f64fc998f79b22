use std::net::IpAddr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::debug;

use crate::error_handling::types::StorageError;
use crate::session_management::session::duration_between;
use crate::session_management::SessionStatus;
use crate::storage::storage_trait::Storage;
use crate::storage::types::{Session, SessionFilter};

/// Session store kept in process memory. Rows are lost when the value is dropped.
#[derive(Default)]
pub struct MemoryStorage {
    sessions: Mutex<Vec<Session>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Session>>, StorageError> {
        self.sessions
            .lock()
            .map_err(|_| StorageError::ReadFailed("session table lock poisoned".into()))
    }
}

impl Storage for MemoryStorage {
    async fn create_session(
        &self,
        remote_addr: IpAddr,
        started_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let mut sessions = self.lock()?;
        let id = sessions.last().map_or(1, |s| s.id + 1);
        sessions.push(Session {
            id,
            remote_addr,
            started_at,
            ended_at: None,
            duration_seconds: None,
            status: SessionStatus::Active,
            created_at: started_at,
        });
        debug!("Inserted in-memory session {} for {}", id, remote_addr);
        Ok(id)
    }

    async fn close_session(
        &self,
        id: i64,
        ended_at: DateTime<Utc>,
        duration_seconds: f64,
        status: SessionStatus,
    ) -> Result<(), StorageError> {
        let mut sessions = self.lock()?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id && s.is_active())
            .ok_or(StorageError::SessionNotActive(id))?;
        session.ended_at = Some(ended_at);
        session.duration_seconds = Some(duration_seconds);
        session.status = status;
        Ok(())
    }

    async fn get_sessions(
        &self,
        filter: Option<SessionFilter>,
    ) -> Result<Vec<Session>, StorageError> {
        let filter = filter.unwrap_or_default();
        Ok(self.lock()?.iter().filter(|s| filter.matches(s)).cloned().collect())
    }

    async fn close_stale_sessions(
        &self,
        now: DateTime<Utc>,
        status: SessionStatus,
    ) -> Result<usize, StorageError> {
        let mut sessions = self.lock()?;
        let mut count = 0;
        for session in sessions.iter_mut().filter(|s| s.is_active()) {
            session.ended_at = Some(now);
            session.duration_seconds = Some(duration_between(session.started_at, now));
            session.status = status;
            count += 1;
        }
        Ok(count)
    }
}
