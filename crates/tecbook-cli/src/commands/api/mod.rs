//! API subcommand implementations.

mod classify;
mod get;
mod post;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use tecbook_core::{ApiResponse, PendingRequest};
use tecbook_http::TecbookClient;

use crate::cli::GlobalArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct ApiCommand {
    #[command(subcommand)]
    pub command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ApiSubcommand {
    /// Send a GET request
    Get(get::GetArgs),

    /// Send a POST request with a JSON body
    Post(post::PostArgs),

    /// Show whether a path requires the session's credential
    Classify(classify::ClassifyArgs),
}

pub async fn handle(cmd: ApiCommand, global: &GlobalArgs) -> Result<()> {
    match cmd.command {
        ApiSubcommand::Get(args) => get::run(args, global).await,
        ApiSubcommand::Post(args) => post::run(args, global).await,
        ApiSubcommand::Classify(args) => classify::run(args),
    }
}

/// Parse a `key=value` query argument.
fn parse_query(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty query key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Send through the gateway, print the response and fail on error statuses.
async fn send_and_print(client: &TecbookClient, request: PendingRequest) -> Result<ApiResponse> {
    let response = client.call(request).await.context("Request failed")?;
    output::response(&response)?;
    if !response.is_success() {
        anyhow::bail!("API answered {}", response.status());
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_parse() {
        assert_eq!(
            parse_query("page=2").unwrap(),
            ("page".to_string(), "2".to_string())
        );
        assert_eq!(
            parse_query("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_query("page").is_err());
        assert!(parse_query("=2").is_err());
    }
}
