use chrono::{DateTime, Utc};

/// Represents an open session, as held by the tracker's in-memory index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSession {
    /// Store-assigned id of the session row.
    pub session_id: i64,
    /// When the remote address was first observed for this session.
    pub started_at: DateTime<Utc>,
}
