use std::net::IpAddr;

use crate::session_management::SessionStatus;

pub use crate::session_management::session::Session;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFilter {
    pub remote_addr: Option<IpAddr>,
    pub status: Option<SessionStatus>,
}

impl SessionFilter {
    pub fn matches(&self, session: &Session) -> bool {
        self.remote_addr.map_or(true, |addr| addr == session.remote_addr)
            && self.status.map_or(true, |status| status == session.status)
    }
}
