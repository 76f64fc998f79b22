//! Session management core module.
//!
//! This module provides the core types and submodules for tracking connection
//! sessions of remote peers on the monitored port.

use std::fmt;
use std::str::FromStr;

/// Submodule for the in-memory view of an open session.
pub mod active_session;
/// Submodule for the persisted session record.
pub mod session;
/// Submodule for the snapshot reconciliation state machine.
pub mod session_tracker;

/// Represents the current status of a session.
///
/// Variants:
/// - `Active`: the remote address is still connected.
/// - `Ended`: the remote address disconnected while the monitor was running.
/// - `TerminatedByShutdown`: the session was closed because the monitor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Active,
    Ended,
    TerminatedByShutdown,
}

impl SessionStatus {
    /// Stored representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
            SessionStatus::TerminatedByShutdown => "terminated-by-shutdown",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "ended" => Ok(SessionStatus::Ended),
            "terminated-by-shutdown" => Ok(SessionStatus::TerminatedByShutdown),
            other => Err(format!("unknown session status `{}`", other)),
        }
    }
}
