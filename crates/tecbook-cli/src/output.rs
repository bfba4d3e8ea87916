//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use tecbook_core::ApiResponse;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning.
pub fn warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print an API response body: pretty JSON when it parses, raw text otherwise.
/// The status line goes to stderr.
pub fn response(response: &ApiResponse) -> Result<()> {
    let status = response.status();
    let line = format!("HTTP {}", status);
    if status.is_success() {
        eprintln!("{}", line.dimmed());
    } else {
        eprintln!("{}", line.red());
    }

    if response.body().is_empty() {
        return Ok(());
    }
    match response.json::<serde_json::Value>() {
        Ok(value) => json_pretty(&value),
        Err(_) => {
            println!("{}", response.text());
            Ok(())
        }
    }
}
