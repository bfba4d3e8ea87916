//! Classify command implementation.

use anyhow::Result;
use clap::Args;

use tecbook_core::EndpointPolicy;

use crate::output;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Path relative to the API base URL
    pub path: String,
}

pub fn run(args: ClassifyArgs) -> Result<()> {
    let access = EndpointPolicy::default().classify(&args.path);
    output::field(&args.path, access.as_str());
    Ok(())
}
