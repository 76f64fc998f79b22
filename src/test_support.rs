//! Test doubles shared by the unit tests of several modules.

use std::collections::{HashSet, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error_handling::types::{NetworkError, NotifyError, StorageError};
use crate::network::SnapshotSource;
use crate::notification::Notifier;
use crate::session_management::SessionStatus;
use crate::storage::memory_storage::MemoryStorage;
use crate::storage::types::{Session, SessionFilter};
use crate::storage::Storage;

pub fn addrs(list: &[&str]) -> HashSet<IpAddr> {
    list.iter().map(|s| s.parse().unwrap()).collect()
}

/// Records every message; optionally reports each send as failed.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NotifyError::Transport("relay refused".into()));
        }
        self.sent.lock().unwrap().push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Never completes a send.
pub struct HangingNotifier;

impl Notifier for HangingNotifier {
    async fn notify(&self, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// In-memory store whose writes can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing_creates: Mutex<HashSet<IpAddr>>,
    failing_closes: AtomicBool,
}

impl FlakyStorage {
    pub fn fail_creates_for(&self, addr: IpAddr) {
        self.failing_creates.lock().unwrap().insert(addr);
    }

    pub fn fail_closes(&self, fail: bool) {
        self.failing_closes.store(fail, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.failing_creates.lock().unwrap().clear();
        self.fail_closes(false);
    }
}

impl Storage for FlakyStorage {
    async fn create_session(
        &self,
        remote_addr: IpAddr,
        started_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        if self.failing_creates.lock().unwrap().contains(&remote_addr) {
            return Err(StorageError::WriteFailed("disk full".into()));
        }
        self.inner.create_session(remote_addr, started_at).await
    }

    async fn close_session(
        &self,
        id: i64,
        ended_at: DateTime<Utc>,
        duration_seconds: f64,
        status: SessionStatus,
    ) -> Result<(), StorageError> {
        if self.failing_closes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed("database is locked".into()));
        }
        self.inner.close_session(id, ended_at, duration_seconds, status).await
    }

    async fn get_sessions(
        &self,
        filter: Option<SessionFilter>,
    ) -> Result<Vec<Session>, StorageError> {
        self.inner.get_sessions(filter).await
    }

    async fn close_stale_sessions(
        &self,
        now: DateTime<Utc>,
        status: SessionStatus,
    ) -> Result<usize, StorageError> {
        self.inner.close_stale_sessions(now, status).await
    }
}

/// Replays a fixed list of snapshots, then reports an empty table.
#[derive(Default)]
pub struct ScriptedSource {
    snapshots: Mutex<VecDeque<Result<HashSet<IpAddr>, NetworkError>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new<I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = Result<HashSet<IpAddr>, NetworkError>>,
    {
        Self {
            snapshots: Mutex::new(snapshots.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SnapshotSource for ScriptedSource {
    fn remote_addresses(&self, _port: u16) -> Result<HashSet<IpAddr>, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HashSet::new()))
    }
}
