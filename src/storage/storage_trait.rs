//! Storage Trait
//!
//! This module defines the `Storage` trait, which provides an interface for
//! session storage backends.
//!
//! Implementors of this trait are responsible for:
//! - Creating the schema (idempotently) when opened
//! - Inserting a row when a session opens and assigning its id
//! - Finalizing a row exactly once when the session closes
//! - Keeping every row across process restarts
//!
//! All methods return a `Result` to handle potential storage errors.

use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error_handling::types::StorageError;
use crate::session_management::SessionStatus;
use crate::storage::types::{Session, SessionFilter};

/// The `Storage` trait defines the interface for session storage backends.
///
/// The session tracker is the only writer, so implementations need no
/// coordination beyond what their own connection handling requires.
pub trait Storage {
    /// Inserts a new `active` session and returns its store-assigned id.
    ///
    /// `created_at` is recorded equal to `started_at`.
    fn create_session(
        &self,
        remote_addr: IpAddr,
        started_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<i64, StorageError>> + Send;

    /// Finalizes an `active` session.
    ///
    /// `ended_at`, `duration_seconds` and `status` are written together. Returns
    /// `StorageError::SessionNotActive` if the row does not exist or was already closed.
    fn close_session(
        &self,
        id: i64,
        ended_at: DateTime<Utc>,
        duration_seconds: f64,
        status: SessionStatus,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Retrieves sessions ordered by id, optionally filtered.
    fn get_sessions(
        &self,
        filter: Option<SessionFilter>,
    ) -> impl Future<Output = Result<Vec<Session>, StorageError>> + Send;

    /// Closes every row still marked `active` with the given status and end time.
    ///
    /// Returns the number of rows closed.
    fn close_stale_sessions(
        &self,
        now: DateTime<Utc>,
        status: SessionStatus,
    ) -> impl Future<Output = Result<usize, StorageError>> + Send;
}

impl<T: Storage + Send + Sync> Storage for Arc<T> {
    fn create_session(
        &self,
        remote_addr: IpAddr,
        started_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<i64, StorageError>> + Send {
        (**self).create_session(remote_addr, started_at)
    }

    fn close_session(
        &self,
        id: i64,
        ended_at: DateTime<Utc>,
        duration_seconds: f64,
        status: SessionStatus,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).close_session(id, ended_at, duration_seconds, status)
    }

    fn get_sessions(
        &self,
        filter: Option<SessionFilter>,
    ) -> impl Future<Output = Result<Vec<Session>, StorageError>> + Send {
        (**self).get_sessions(filter)
    }

    fn close_stale_sessions(
        &self,
        now: DateTime<Utc>,
        status: SessionStatus,
    ) -> impl Future<Output = Result<usize, StorageError>> + Send {
        (**self).close_stale_sessions(now, status)
    }
}
