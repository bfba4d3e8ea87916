//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::GlobalArgs;
use crate::config::Settings;
use crate::output;
use crate::session::open_client;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global)?;
    let client = open_client(&settings)?;

    if !client.store().is_authenticated() {
        output::success("No active session");
        return Ok(());
    }

    client.logout().await;

    output::success("Logged out");
    Ok(())
}
