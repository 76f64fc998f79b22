//! Storage subsystem
//!
//! This module provides abstractions and implementations for persisting
//! connection sessions.
//!
//! Components:
//! - `storage_trait`: the Storage trait defining a uniform API.
//! - `types`: shared data types used by storage backends.
//! - `database_storage`: SQLite implementation using sqlx.
//! - `memory_storage`: process-local implementation, nothing survives a restart.
//! - `session_filter`: helpers to build session queries.

pub mod database_storage;
pub mod memory_storage;
pub mod session_filter;
pub mod storage_trait;
pub mod types;

pub use storage_trait::Storage;
