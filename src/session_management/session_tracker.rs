use crate::active_session::ActiveSession;
use crate::error_handling::types::{NotifyError, StorageError};
use crate::network::connection_filter::normalize;
use crate::notification::{NewConnectionAlert, Notifier};
use crate::session::duration_between;
use crate::storage::Storage;
use crate::SessionStatus;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::time::Duration;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Sessions opened and recorded in the store
    pub opened: usize,
    /// Sessions closed in the store
    pub closed: usize,
    /// Store writes that failed and will be retried on a later tick
    pub failed: usize,
}

impl TickSummary {
    pub fn is_quiet(&self) -> bool {
        self.opened == 0 && self.closed == 0 && self.failed == 0
    }
}

/// The session tracking state machine.
///
/// Turns periodic snapshots of connected remote addresses into session rows.
/// The tracker is the only writer of the store.
///
/// # Fields Overview
///
/// - `active_sessions`: exactly the sessions currently `active` in the store, keyed by address
/// - `notified`: addresses already notified for their current open session
/// - `storage`: where session rows are persisted
/// - `notifier`: where new-connection alerts are sent
/// - `port`: the monitored port, quoted in alerts
/// - `notify_timeout`: upper bound for one notification send
pub struct SessionTracker<S, N> {
    active_sessions: HashMap<IpAddr, ActiveSession>,
    notified: HashSet<IpAddr>,
    storage: S,
    notifier: N,
    port: u16,
    notify_timeout: Duration,
}

enum CloseOutcome {
    Closed,
    Retry,
    Dropped,
}

impl<S: Storage, N: Notifier> SessionTracker<S, N> {
    pub fn new(storage: S, notifier: N, port: u16, notify_timeout: Duration) -> Self {
        Self {
            active_sessions: HashMap::new(),
            notified: HashSet::new(),
            storage,
            notifier,
            port,
            notify_timeout,
        }
    }

    /// Reconciles the latest snapshot against the open sessions.
    ///
    /// Addresses newly present open a session (and notify once); addresses
    /// no longer present close theirs with status `ended`. A store failure only
    /// affects its own address.
    pub async fn reconcile(
        &mut self,
        current: &HashSet<IpAddr>,
        now: DateTime<Utc>,
    ) -> TickSummary {
        let mut summary = TickSummary::default();
        let current: HashSet<IpAddr> = current.iter().copied().filter_map(normalize).collect();

        let mut appeared: Vec<IpAddr> = current
            .iter()
            .filter(|addr| !self.active_sessions.contains_key(*addr))
            .copied()
            .collect();
        appeared.sort();
        for addr in appeared {
            if self.open_session(addr, now).await {
                summary.opened += 1;
            } else {
                summary.failed += 1;
            }
        }

        let mut vanished: Vec<IpAddr> = self
            .active_sessions
            .keys()
            .filter(|addr| !current.contains(*addr))
            .copied()
            .collect();
        vanished.sort();
        for addr in vanished {
            match self.close_session(addr, now, SessionStatus::Ended).await {
                CloseOutcome::Closed => summary.closed += 1,
                CloseOutcome::Retry => summary.failed += 1,
                CloseOutcome::Dropped => {}
            }
        }

        summary
    }

    /// Closes every open session with status `terminated-by-shutdown`.
    ///
    /// Best-effort: failures are logged and the in-memory state is cleared
    /// regardless. Returns the number of sessions closed in the store.
    pub async fn shutdown(&mut self, now: DateTime<Utc>) -> usize {
        let mut addrs: Vec<IpAddr> = self.active_sessions.keys().copied().collect();
        addrs.sort();
        let mut closed = 0;
        for addr in addrs {
            if let CloseOutcome::Closed =
                self.close_session(addr, now, SessionStatus::TerminatedByShutdown).await
            {
                closed += 1;
            }
        }
        if !self.active_sessions.is_empty() {
            warn!(
                "[!] {} session(s) could not be finalized at shutdown",
                self.active_sessions.len()
            );
        }
        self.active_sessions.clear();
        self.notified.clear();
        closed
    }

    pub fn active_session_count(&self) -> usize {
        self.active_sessions.len()
    }

    pub fn active_session(&self, addr: &IpAddr) -> Option<&ActiveSession> {
        self.active_sessions.get(addr)
    }

    pub fn is_notified(&self, addr: &IpAddr) -> bool {
        self.notified.contains(addr)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn open_session(&mut self, addr: IpAddr, now: DateTime<Utc>) -> bool {
        let session_id = match self.storage.create_session(addr, now).await {
            Ok(id) => id,
            Err(e) => {
                error!("[!] Unable to record new session for {}: {}", addr, e);
                return false;
            }
        };
        self.active_sessions.insert(
            addr,
            ActiveSession {
                session_id,
                started_at: now,
            },
        );
        info!("[+] Session started: {} (id={})", addr, session_id);

        if self.notified.insert(addr) {
            let alert = NewConnectionAlert {
                remote_addr: addr,
                port: self.port,
                started_at: now,
            };
            match self.send_alert(&alert).await {
                Ok(()) => info!("[+] Notification sent for {}", addr),
                Err(e) => warn!("[!] Notification for {} failed: {}", addr, e),
            }
        }
        true
    }

    async fn send_alert(&self, alert: &NewConnectionAlert) -> Result<(), NotifyError> {
        let subject = alert.subject();
        let body = alert.body();
        let send = self.notifier.notify(&subject, &body);
        match tokio::time::timeout(self.notify_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.notify_timeout)),
        }
    }

    async fn close_session(
        &mut self,
        addr: IpAddr,
        now: DateTime<Utc>,
        status: SessionStatus,
    ) -> CloseOutcome {
        let Some(active) = self.active_sessions.get(&addr).copied() else {
            return CloseOutcome::Dropped;
        };
        let duration = duration_between(active.started_at, now);

        let outcome = match self
            .storage
            .close_session(active.session_id, now, duration, status)
            .await
        {
            Ok(()) => {
                info!(
                    "[-] Session ended: {} (id={}) | lasted {:.1}s | {}",
                    addr, active.session_id, duration, status
                );
                CloseOutcome::Closed
            }
            Err(StorageError::SessionNotActive(id)) => {
                warn!(
                    "[!] Session {} for {} is no longer active in the store, dropping it",
                    id, addr
                );
                CloseOutcome::Dropped
            }
            Err(e) => {
                error!(
                    "[!] Unable to close session {} for {}: {}",
                    active.session_id, addr, e
                );
                return CloseOutcome::Retry;
            }
        };

        self.active_sessions.remove(&addr);
        self.notified.remove(&addr);
        debug!("{} session(s) still open", self.active_sessions.len());
        outcome
    }
}
