//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::api::ApiCommand;
use crate::commands::session::SessionCommand;

/// TecBook CLI for authenticated API sessions.
#[derive(Parser, Debug)]
#[command(name = "tecbook")]
#[command(author, version = env!("TECBOOK_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to find the API and the session.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// API base URL (for example https://tecbook.example.com/api)
    #[arg(long, env = "TECBOOK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Session file path
    #[arg(long, env = "TECBOOK_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, env = "TECBOOK_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in, log out and inspect the session
    Session(SessionCommand),

    /// Call the API with the session's credential
    Api(ApiCommand),
}
