//! Google login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::GlobalArgs;
use crate::config::Settings;
use crate::session::open_client;

#[derive(Args, Debug)]
pub struct LoginGoogleArgs {
    /// Google ID token issued to the TecBook client
    #[arg(long)]
    pub id_token: String,
}

pub async fn run(args: LoginGoogleArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global)?;
    let client = open_client(&settings)?;

    eprintln!("{}", "Exchanging Google token...".dimmed());

    let outcome = client
        .login_with_google(&args.id_token)
        .await
        .context("Failed to login with Google")?;

    super::print_login(&outcome);
    Ok(())
}
