//! Opening the persisted session for a command.

use anyhow::{Context, Result};

use tecbook_core::CredentialStore;
use tecbook_file::FileBackend;
use tecbook_http::TecbookClient;

use crate::config::Settings;
use crate::output;

/// Open a client on the session file named by `settings`.
///
/// A session invalidated while the command runs prints a single notice.
pub fn open_client(settings: &Settings) -> Result<TecbookClient> {
    let backend = FileBackend::new(&settings.session_file);
    let store = CredentialStore::open(backend).with_context(|| {
        format!(
            "Failed to load session from {}",
            settings.session_file.display()
        )
    })?;

    let client = TecbookClient::new(settings.client_config(), store)
        .context("Failed to create HTTP client")?;

    client.on_session_invalidated(|reason| {
        output::error(&format!(
            "Session expired ({}). Run 'tecbook session login' to log in again.",
            reason
        ));
    });

    Ok(client)
}
