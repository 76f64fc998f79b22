//! Helpers for building `SessionFilter` values.
//!
//! This module re-exports `SessionFilter` and provides convenience builders
//! for common query criteria.

use std::net::IpAddr;

use crate::session_management::SessionStatus;

pub use crate::storage::types::SessionFilter;

/// Build a `SessionFilter` that matches every session of one remote address.
pub fn by_remote_addr(addr: IpAddr) -> SessionFilter {
    SessionFilter { remote_addr: Some(addr), ..Default::default() }
}

/// Build a `SessionFilter` that matches sessions in the given status.
pub fn by_status(status: SessionStatus) -> SessionFilter {
    SessionFilter { status: Some(status), ..Default::default() }
}

/// Build a `SessionFilter` that matches the still-open sessions.
pub fn active() -> SessionFilter {
    by_status(SessionStatus::Active)
}
