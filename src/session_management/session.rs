use crate::SessionStatus;
use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// One contiguous period during which a remote address held at least one
/// connection to the monitored port.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub remote_addr: IpAddr,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Seconds elapsed between `started_at` and `ended_at`, never negative.
pub fn duration_between(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> f64 {
    let millis = (ended_at - started_at).num_milliseconds();
    (millis as f64 / 1000.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_duration_between() {
        let t0 = Utc::now();
        assert_eq!(duration_between(t0, t0 + Duration::milliseconds(2500)), 2.5);
    }

    #[test]
    fn test_duration_is_clamped_when_clock_goes_backwards() {
        let t0 = Utc::now();
        assert_eq!(duration_between(t0, t0 - Duration::seconds(3)), 0.0);
    }
}
