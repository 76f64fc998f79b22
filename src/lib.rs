pub mod configuration;

pub mod controller;

pub mod error_handling;

pub mod network;

pub mod notification;

pub mod session_management;
pub use session_management::*;

pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
