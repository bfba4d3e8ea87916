//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tecbook_core::LoginCredentials;

use crate::cli::GlobalArgs;
use crate::config::Settings;
use crate::session::open_client;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Institutional email address
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "TECBOOK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global)?;
    let client = open_client(&settings)?;
    let credentials = LoginCredentials::new(&args.email, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let outcome = client
        .login(&credentials)
        .await
        .context("Failed to login")?;

    super::print_login(&outcome);
    Ok(())
}
