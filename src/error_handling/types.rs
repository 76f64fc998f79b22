use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
    #[error("Value out of range: {0}")]
    NotInRange(String),
    #[error("Invalid address `{address}`: {reason}")]
    BadAddress { address: String, reason: String },
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Unable to read connection table {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Connection table parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),
    #[error("Storage write failed: {0}")]
    WriteFailed(String),
    #[error("Storage read failed: {0}")]
    ReadFailed(String),
    #[error("Session {0} is not active")]
    SessionNotActive(i64),
    #[error("Corrupt session row: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Unable to build message: {0}")]
    BuildFailed(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Notification timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}
