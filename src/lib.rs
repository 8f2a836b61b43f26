//! FGP GitHub client - talk to the FGP GitHub daemon over its local socket
//!
//! The library half is the transport: one newline-terminated JSON request
//! per connection, one response back. The binary is a thin CLI on top.

pub mod cli;
pub mod commands;
pub mod common;
pub mod ipc;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use ipc::{ClientConfig, DaemonClient, DaemonError, Method, Reply, Response};
