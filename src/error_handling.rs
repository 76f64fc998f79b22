//! Error types shared by every subsystem.
pub mod types;
