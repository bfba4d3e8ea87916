//! GET command implementation.

use anyhow::Result;
use clap::Args;

use tecbook_core::PendingRequest;

use crate::cli::GlobalArgs;
use crate::config::Settings;
use crate::session::open_client;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path relative to the API base URL (for example /aulas)
    pub path: String,

    /// Query parameter, repeatable
    #[arg(long = "query", short = 'q', value_parser = super::parse_query)]
    pub query: Vec<(String, String)>,
}

pub async fn run(args: GetArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global)?;
    let client = open_client(&settings)?;

    let request = args
        .query
        .into_iter()
        .fold(PendingRequest::get(args.path), |request, (key, value)| {
            request.query(key, value)
        });

    super::send_and_print(&client, request).await?;
    Ok(())
}
