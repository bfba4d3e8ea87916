//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::GlobalArgs;
use crate::config::Settings;
use crate::output;
use crate::session::open_client;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Show the cached identity instead of asking the API
    #[arg(long)]
    pub cached: bool,
}

pub async fn run(args: WhoamiArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global)?;
    let client = open_client(&settings)?;

    if !client.store().is_authenticated() {
        anyhow::bail!("No active session. Run 'tecbook session login' first.");
    }

    let identity = if args.cached {
        client
            .store()
            .identity()
            .context("No cached identity. Run 'tecbook session whoami' without --cached.")?
    } else {
        client
            .current_user()
            .await
            .context("Failed to fetch current user")?
    };

    output::field("ID", &identity.user_id.to_string());
    output::field("Name", &identity.display_name);
    output::field("Email", &identity.email);
    output::field("Role", identity.role.as_str());
    Ok(())
}
