//! Status command implementation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use tecbook_core::{Credential, CredentialStore, Identity};
use tecbook_file::FileBackend;

use crate::cli::GlobalArgs;
use crate::config::Settings;
use crate::output;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

/// What `status` reports. Tokens are never printed.
#[derive(Debug, Serialize)]
struct SessionStatus {
    authenticated: bool,
    api_url: String,
    session_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    issued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    expired: bool,
    can_refresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<Identity>,
}

impl SessionStatus {
    fn new(settings: &Settings, credential: Option<&Credential>, user: Option<Identity>) -> Self {
        let now = Utc::now();
        Self {
            authenticated: credential.is_some(),
            api_url: settings.api_url.to_string(),
            session_file: settings.session_file.display().to_string(),
            issued_at: credential.map(|c| c.issued_at),
            expires_at: credential.and_then(|c| c.expires_at),
            expired: credential.is_some_and(|c| c.is_expired_at(now)),
            can_refresh: credential.is_some_and(Credential::can_refresh),
            user,
        }
    }
}

pub async fn run(args: StatusArgs, global: &GlobalArgs) -> Result<()> {
    let settings = Settings::resolve(global)?;
    // Reads only; no client needed.
    let store = CredentialStore::open(FileBackend::new(&settings.session_file))?;
    let record = store.snapshot();

    let status = SessionStatus::new(
        &settings,
        record.as_ref().map(|r| &r.credential),
        record.as_ref().and_then(|r| r.identity.clone()),
    );

    if args.json {
        return output::json_pretty(&status);
    }

    if !status.authenticated {
        output::field("Status", "not logged in");
        output::field("API", &status.api_url);
        return Ok(());
    }

    output::field("Status", if status.expired { "expired" } else { "logged in" });
    output::field("API", &status.api_url);
    if let Some(user) = &status.user {
        output::field("User", &user.display_name);
        output::field("Email", &user.email);
        output::field("Role", user.role.as_str());
    }
    if let Some(expires_at) = status.expires_at {
        output::field("Expires", &expires_at.to_rfc3339());
    }
    output::field("Refresh", if status.can_refresh { "available" } else { "none" });
    output::field("Session file", &status.session_file);
    Ok(())
}
