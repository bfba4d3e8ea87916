//! Adopt-token command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tecbook_core::{AccessToken, RefreshToken};

use crate::cli::GlobalArgs;
use crate::config::Settings;
use crate::output;
use crate::session::open_client;

#[derive(Args, Debug)]
pub struct AdoptTokenArgs {
    /// Access token
    #[arg(long)]
    pub token: String,

    /// Refresh token, if one was issued
    #[arg(long)]
    pub refresh: Option<String>,
}

pub async fn run(args: AdoptTokenArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global)?;
    let client = open_client(&settings)?;

    client
        .adopt_token(
            AccessToken::new(args.token),
            args.refresh.map(RefreshToken::new),
        )
        .context("Failed to store token")?;

    output::success("Token stored");
    output::field("Session file", &settings.session_file.display().to_string());
    Ok(())
}
