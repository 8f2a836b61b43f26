//! IPC communication with FGP daemons
//!
//! Newline-delimited JSON over Unix domain sockets via the interprocess
//! crate, one request per connection.

pub mod client;
pub mod protocol;
pub mod transport;

pub use client::{ClientConfig, DaemonClient};
pub use protocol::{DaemonError, Method, Reply, Request, Response};
