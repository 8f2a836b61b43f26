//! CLI command definitions
//!
//! Defines the clap commands for the fgp-github CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::ipc::protocol::State;

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Daemon socket path (default: ~/.fgp/services/github/daemon.sock)
    #[arg(long, global = true)]
    pub socket: Option<PathBuf>,

    /// Seconds to wait for the daemon's response
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Print the raw result object as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the daemon is up
    Health,

    /// Show the authenticated GitHub user
    User,

    /// List your repositories, or another user's
    Repos {
        /// GitHub user whose repositories to list
        #[arg(long, short)]
        user: Option<String>,

        /// Maximum number of repositories
        #[arg(long, short)]
        limit: Option<u32>,
    },

    /// List issues for a repository
    Issues {
        /// Repository in owner/repo form
        repo: String,

        /// open, closed or all
        #[arg(long, short)]
        state: Option<State>,

        /// Maximum number of issues
        #[arg(long, short)]
        limit: Option<u32>,
    },

    /// List pull requests for a repository
    Prs {
        /// Repository in owner/repo form
        repo: String,

        /// open, closed or all
        #[arg(long, short)]
        state: Option<State>,

        /// Maximum number of pull requests
        #[arg(long, short)]
        limit: Option<u32>,
    },

    /// Show one pull request with reviews and status checks
    Pr {
        /// Repository in owner/repo form
        repo: String,

        /// Pull request number
        number: u64,
    },

    /// Show unread notifications
    Notifications {
        /// Maximum number of notifications
        #[arg(long, short)]
        limit: Option<u32>,
    },

    /// Create an issue
    CreateIssue {
        /// Repository in owner/repo form
        repo: String,

        /// Issue title
        title: String,

        /// Issue body (Markdown)
        #[arg(long)]
        body: Option<String>,

        /// Label to apply, can be repeated
        #[arg(long = "label")]
        labels: Vec<String>,
    },

    /// Call any daemon method with raw JSON parameters
    Call {
        /// Method name, e.g. github.repos
        method: String,

        /// Parameters as a JSON object
        #[arg(long = "params", short = 'p')]
        params: Option<String>,
    },

    /// Health check, then repos, issues, pull requests and notifications
    Overview {
        /// Repository to list issues and pull requests for
        repo: String,

        /// Maximum entries per section
        #[arg(long, short, default_value_t = 5)]
        limit: u32,
    },
}
