//! Error types for the daemon client
//!
//! These are transport and local failures only. A daemon that answers with
//! `ok: false` is not an error here; that outcome is carried as
//! [`DaemonError`](crate::ipc::protocol::DaemonError) data instead.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::ipc::client::CallPhase;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the client
#[derive(Error, Debug)]
pub enum Error {
    // === Transport Errors ===
    #[error("Daemon not running at {}. Start it with 'fgp start github'", .path.display())]
    DaemonNotRunning { path: PathBuf },

    #[error("Failed to connect to daemon: {0}")]
    DaemonConnectionFailed(#[source] io::Error),

    #[error("Daemon communication error: {0}")]
    DaemonCommunication(#[source] io::Error),

    #[error("Incomplete response: connection closed after {received} bytes without a frame terminator")]
    Framing { received: usize },

    #[error("Response exceeds {limit} bytes without a frame terminator")]
    FrameTooLarge { limit: usize },

    #[error("Malformed response from daemon: {0}")]
    Decode(String),

    #[error("Daemon did not answer within {limit:?} (while {phase})")]
    Timeout { phase: CallPhase, limit: Duration },

    #[error("Response id mismatch: expected {expected}, got {actual}")]
    CorrelationMismatch { expected: String, actual: String },

    // === Request Errors ===
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this failure happened at the byte-exchange level
    ///
    /// Transport failures mean the daemon is unreachable or misbehaving;
    /// callers running a batch should stop rather than try the next call.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::DaemonNotRunning { .. }
                | Self::DaemonConnectionFailed(_)
                | Self::DaemonCommunication(_)
                | Self::Framing { .. }
                | Self::FrameTooLarge { .. }
                | Self::Decode(_)
                | Self::Timeout { .. }
                | Self::CorrelationMismatch { .. }
        )
    }

    /// Create a decode error from anything displayable
    pub fn decode<E: std::fmt::Display>(err: E) -> Self {
        Self::Decode(err.to_string())
    }

    /// Map a connect failure to the right variant
    ///
    /// A missing socket file or a refused connection both mean nobody is
    /// listening.
    pub fn from_connect(err: io::Error, path: PathBuf) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => {
                Self::DaemonNotRunning { path }
            }
            _ => Self::DaemonConnectionFailed(err),
        }
    }
}
