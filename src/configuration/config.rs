use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments.
///
/// Every flag can also be supplied through the environment variable named in
/// its help text, including variables loaded from a `.env` file. Values given
/// here take precedence over the TOML file passed with `--config`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "portwatch")]
#[command(version)]
#[command(about = "Tracks remote connection sessions on a local TCP port")]
pub struct Args {
    /// Optional TOML configuration file
    #[arg(long = "config", short = 'c', env = "PORTWATCH_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Local TCP port to monitor [default: 7788]
    #[arg(long, short = 'p', env = "PORTWATCH_PORT")]
    pub port: Option<u16>,

    /// Seconds to sleep between two snapshots [default: 1]
    #[arg(long, env = "PORTWATCH_INTERVAL_SECS")]
    pub interval_secs: Option<u64>,

    /// SQLite database file [default: <exe dir>/<port>_connections.sqlite3]
    #[arg(long, env = "PORTWATCH_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Upper bound in seconds for one notification send [default: 5]
    #[arg(long, env = "PORTWATCH_NOTIFY_TIMEOUT_SECS")]
    pub notify_timeout_secs: Option<u64>,

    /// SMTP relay host name
    #[arg(long, env = "SMTP_SERVER")]
    pub smtp_server: Option<String>,

    /// SMTP relay port [default: 465]
    #[arg(long, env = "SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// SMTP connection security [default: tls]
    #[arg(long, value_enum, env = "SMTP_SECURITY")]
    pub smtp_security: Option<SmtpSecurity>,

    /// Sender mailbox, also used as the SMTP login
    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    /// SMTP password of the sender
    #[arg(long, env = "SENDER_PASSWORD", hide_env_values = true)]
    pub sender_password: Option<String>,

    /// Mailbox receiving the notifications
    #[arg(long, env = "RECIPIENT_EMAIL")]
    pub recipient_email: Option<String>,
}

/// Application configuration, resolved once at startup and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Monitored local port
    pub port: u16,
    /// Pause between two ticks of the polling loop
    pub interval: Duration,
    /// Location of the session database
    pub db_path: PathBuf,
    /// Bound applied to each notification send
    pub notify_timeout: Duration,
    /// Notification transport settings
    pub smtp: SmtpConfig,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    non_empty(value).ok_or(ConfigError::MissingSetting(key))
}

fn seconds(value: u64, key: &str) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::NotInRange(format!("{} must be at least 1 second", key)));
    }
    Ok(Duration::from_secs(value))
}

/// Directory holding the running executable, if it can be determined.
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Default database location: next to the executable, named after the port.
pub fn default_db_path(port: u16) -> PathBuf {
    let file = format!("{}_connections.sqlite3", port);
    match executable_dir() {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    }
}

/// Loads `.env` next to the executable, then `.env` in the working directory.
///
/// Variables already present in the environment are never overwritten.
/// Returns the files that were loaded.
pub fn load_env_files() -> Vec<PathBuf> {
    let mut loaded = Vec::new();
    if let Some(dir) = executable_dir() {
        let path = dir.join(".env");
        if dotenvy::from_path(&path).is_ok() {
            loaded.push(path);
        }
    }
    if let Ok(path) = dotenvy::dotenv() {
        if !loaded.contains(&path) {
            loaded.push(path);
        }
    }
    loaded
}

impl Config {
    /// Parses a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&content)?;
        debug!("Read configuration file {}", path.display());
        Ok(file)
    }

    /// Resolves the configuration from command-line/environment values and
    /// the optional file they point to.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config_file {
            Some(path) => Self::from_file(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args.clone(), file)
    }

    fn merge(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(ConfigError::NotInRange("port must be between 1 and 65535".into()));
        }

        let interval = seconds(
            args.interval_secs.or(file.interval_secs).unwrap_or(DEFAULT_INTERVAL_SECS),
            "interval_secs",
        )?;
        let notify_timeout = seconds(
            args.notify_timeout_secs
                .or(file.notify_timeout_secs)
                .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_SECS),
            "notify_timeout_secs",
        )?;
        let db_path = args
            .db_path
            .or(file.db_path)
            .unwrap_or_else(|| default_db_path(port));

        let smtp_file = file.smtp;
        let smtp = SmtpConfig {
            server: require(
                non_empty(args.smtp_server).or(smtp_file.server),
                "SMTP_SERVER (smtp.server)",
            )?,
            port: args.smtp_port.or(smtp_file.port).unwrap_or(DEFAULT_SMTP_PORT),
            sender: require(
                non_empty(args.sender_email).or(smtp_file.sender),
                "SENDER_EMAIL (smtp.sender)",
            )?,
            password: require(
                non_empty(args.sender_password).or(smtp_file.password),
                "SENDER_PASSWORD (smtp.password)",
            )?,
            recipient: require(
                non_empty(args.recipient_email).or(smtp_file.recipient),
                "RECIPIENT_EMAIL (smtp.recipient)",
            )?,
            security: args.smtp_security.or(smtp_file.security).unwrap_or_default(),
        };
        if smtp.port == 0 {
            return Err(ConfigError::NotInRange("SMTP port must be between 1 and 65535".into()));
        }

        Ok(Config {
            port,
            interval,
            db_path,
            notify_timeout,
            smtp,
        })
    }
}
