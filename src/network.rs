//! # Network Module
//!
//! Observation of the kernel connection table: which remote peers currently
//! hold a connection to the monitored port.
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │ /proc/net/tcp    │───▶│ ProcNetSource    │───▶│ SessionTracker  │
//! │ /proc/net/tcp6   │    │ - port / state   │    │ (one snapshot   │
//! └──────────────────┘    │ - normalization  │    │  per tick)      │
//!                         └──────────────────┘    └─────────────────┘
//! ```

pub mod connection_filter;
pub mod proc_net;
pub mod snapshot_source;
pub mod types;

pub use snapshot_source::{ProcNetSource, SnapshotSource};
