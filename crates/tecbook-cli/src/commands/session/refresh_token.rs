//! Refresh token command implementation.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use crate::cli::GlobalArgs;
use crate::config::Settings;
use crate::output;
use crate::session::open_client;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(_args: RefreshTokenArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global)?;
    let client = open_client(&settings)?;

    let Some(current) = client.store().credential() else {
        anyhow::bail!("No active session. Run 'tecbook session login' first.");
    };
    if !current.can_refresh() {
        anyhow::bail!("This session has no refresh token and cannot be refreshed.");
    }

    eprintln!("{}", "Refreshing session...".dimmed());

    let credential = client
        .refresh()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");
    if let Some(left) = credential.time_to_expiry(Utc::now()) {
        output::field("Expires in", &format!("{}s", left.num_seconds()));
    }
    Ok(())
}
