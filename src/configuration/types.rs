use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 7788;
pub const DEFAULT_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// TLS from the first byte (SMTPS, usually port 465)
    #[default]
    Tls,
    /// Plain connection upgraded with STARTTLS (usually port 587)
    #[value(name = "starttls")]
    StartTls,
}

/// Settings of the SMTP relay used for notifications.
#[derive(Clone, PartialEq)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
    pub recipient: String,
    pub security: SmtpSecurity,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("security", &self.security)
            .finish()
    }
}

/// Contents of the optional TOML configuration file. Every key may be omitted.
///
/// ```toml
/// port = 7788
/// interval_secs = 1
/// db_path = "/var/lib/portwatch/7788_connections.sqlite3"
/// notify_timeout_secs = 5
///
/// [smtp]
/// server = "smtp.example.com"
/// port = 465
/// sender = "monitor@example.com"
/// password = "app-password"
/// recipient = "admin@example.com"
/// security = "tls"
/// ```
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub interval_secs: Option<u64>,
    pub db_path: Option<PathBuf>,
    pub notify_timeout_secs: Option<u64>,
    #[serde(default)]
    pub smtp: SmtpFileConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SmtpFileConfig {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub sender: Option<String>,
    pub password: Option<String>,
    pub recipient: Option<String>,
    pub security: Option<SmtpSecurity>,
}
