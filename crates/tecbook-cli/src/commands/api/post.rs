//! POST command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tecbook_core::PendingRequest;

use crate::cli::GlobalArgs;
use crate::config::Settings;
use crate::session::open_client;

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Path relative to the API base URL (for example /aulas)
    pub path: String,

    /// JSON request body
    #[arg(long, short = 'd')]
    pub data: Option<String>,
}

pub async fn run(args: PostArgs, global: &GlobalArgs) -> Result<()> {
    let body: Option<serde_json::Value> = args
        .data
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("Invalid JSON in --data")?;

    let settings = Settings::resolve(global)?;
    let client = open_client(&settings)?;

    let mut request = PendingRequest::post(args.path);
    if let Some(body) = body {
        request = request.json_value(body);
    }

    super::send_and_print(&client, request).await?;
    Ok(())
}
