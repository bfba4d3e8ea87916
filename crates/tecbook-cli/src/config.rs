//! Settings resolution: flags and environment over the config file over defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::debug;

use tecbook_core::ApiUrl;
use tecbook_http::ClientConfig;

use crate::cli::GlobalArgs;

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub session_file: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub refresh_margin_secs: Option<u64>,
}

impl FileConfig {
    /// Load a config file. A missing file at the default location is not
    /// an error; a missing file that was asked for explicitly is.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        if !explicit && !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug)]
pub struct Settings {
    pub api_url: ApiUrl,
    pub session_file: PathBuf,
    pub request_timeout: Option<Duration>,
    pub refresh_margin: Option<Duration>,
}

impl Settings {
    pub fn resolve(global: &GlobalArgs) -> Result<Self> {
        let (config_path, explicit) = match &global.config {
            Some(path) => (path.clone(), true),
            None => (project_dirs()?.config_dir().join("config.toml"), false),
        };
        let file = FileConfig::load(&config_path, explicit)?;

        let api_url = global
            .api_url
            .clone()
            .or(file.api_url)
            .context("No API URL configured. Pass --api-url, set TECBOOK_API_URL, or add api_url to the config file.")?;
        let api_url = ApiUrl::new(&api_url).context("Invalid API URL")?;

        let session_file = match global.session_file.clone().or(file.session_file) {
            Some(path) => path,
            None => default_session_file()?,
        };

        Ok(Self {
            api_url,
            session_file,
            request_timeout: file.request_timeout_secs.map(Duration::from_secs),
            refresh_margin: file.refresh_margin_secs.map(Duration::from_secs),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.api_url.clone())
            .with_user_agent(concat!("tecbook-cli/", env!("TECBOOK_VERSION")));
        if let Some(timeout) = self.request_timeout {
            config = config.with_request_timeout(timeout);
        }
        if let Some(margin) = self.refresh_margin {
            config = config.with_refresh_margin(margin);
        }
        config
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "tecbook").context("Could not determine config directory")
}

/// Get the default session file path.
fn default_session_file() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("session.json"))
}
