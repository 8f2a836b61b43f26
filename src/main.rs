//! fgp-github - command-line client for the FGP GitHub daemon
//!
//! Talks to the daemon over its Unix domain socket, one request per
//! connection.

use std::process::ExitCode;

use clap::Parser;
use fgp_github::commands::{Commands, GlobalOptions};
use fgp_github::{cli, common::logging};

#[derive(Parser)]
#[command(name = "fgp-github", about = "Client for the FGP GitHub daemon")]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_cli(cli.options.verbose);

    match cli::dispatch(&cli.options, cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
