//! Socket and configuration paths
//!
//! FGP daemons listen at `~/.fgp/services/<service>/daemon.sock`.

use std::path::{Path, PathBuf};

/// Application name used for the config directory
const APP_NAME: &str = "fgp-github";

/// Root of the per-user FGP tree, relative to the home directory
const FGP_ROOT: &str = ".fgp";

/// File name of a service's socket inside its service directory
const SOCKET_FILE: &str = "daemon.sock";

/// Default service this client talks to
pub const DEFAULT_SERVICE: &str = "github";

/// Get the user's home directory
pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Get the directory holding all FGP service sockets
///
/// `~/.fgp/services`
pub fn services_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(FGP_ROOT).join("services"))
}

/// Get the socket path for a named service
///
/// `~/.fgp/services/<service>/daemon.sock`
pub fn service_socket_path(service: &str) -> Option<PathBuf> {
    services_dir().map(|dir| dir.join(service).join(SOCKET_FILE))
}

/// Expand a leading `~/` against the home directory
///
/// Paths without the prefix are returned unchanged, as is the input when no
/// home directory can be determined.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/fgp-github/`
/// - macOS: `~/Library/Application Support/fgp-github/`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
