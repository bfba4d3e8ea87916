use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Session file used by every command run in `home`.
pub fn session_file(home: &Path) -> PathBuf {
    home.join("session.json")
}

/// Run the CLI with an isolated HOME, session file and API URL.
pub fn run_cli_with_env(args: &[&str], home: &Path, api_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tecbook"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env("XDG_CONFIG_HOME", home.join("config"));
    cmd.env("TECBOOK_API_URL", api_url);
    cmd.env("TECBOOK_SESSION_FILE", session_file(home));
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("TECBOOK_CONFIG");
    cmd.env_remove("TECBOOK_PASSWORD");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI with an isolated HOME and expect success.
pub fn run_cli_with_env_success(args: &[&str], home: &Path, api_url: &str) -> String {
    let output = run_cli_with_env(args, home, api_url);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI with an isolated HOME and expect failure; returns stderr.
pub fn run_cli_with_env_failure(args: &[&str], home: &Path, api_url: &str) -> String {
    let output = run_cli_with_env(args, home, api_url);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Read the access token persisted in the session file.
pub fn stored_access_token(home: &Path) -> Option<String> {
    let json = std::fs::read_to_string(session_file(home)).ok()?;
    let value: serde_json::Value = serde_json::from_str(&json).ok()?;
    value["session"]["credential"]["access_token"]
        .as_str()
        .map(str::to_string)
}
