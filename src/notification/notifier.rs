use std::future::Future;
use std::net::IpAddr;

use chrono::{DateTime, Local, Utc};

use crate::error_handling::types::NotifyError;

/// Outbound message sink.
///
/// Callers treat every error as non-fatal: it is logged and never retried.
pub trait Notifier {
    fn notify(
        &self,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Alert sent once per session when a remote address starts connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConnectionAlert {
    pub remote_addr: IpAddr,
    pub port: u16,
    pub started_at: DateTime<Utc>,
}

impl NewConnectionAlert {
    pub fn subject(&self) -> String {
        format!("New connection detected on port {}", self.port)
    }

    pub fn body(&self) -> String {
        let started = self.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
        format!(
            "A new external connection to local port {port} was detected:\n\
             \n\
             Remote IP: {addr}\n\
             Session start: {started}\n\
             \n\
             Please confirm this access is legitimate.\n",
            port = self.port,
            addr = self.remote_addr,
            started = started,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_mentions_address_and_port() {
        let alert = NewConnectionAlert {
            remote_addr: "203.0.113.45".parse().unwrap(),
            port: 7788,
            started_at: Utc::now(),
        };
        assert_eq!(alert.subject(), "New connection detected on port 7788");
        let body = alert.body();
        assert!(body.contains("Remote IP: 203.0.113.45"));
        assert!(body.contains("port 7788"));
        assert!(body.contains("Session start: "));
    }
}
