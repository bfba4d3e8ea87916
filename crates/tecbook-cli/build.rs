//! Build script embedding the version shown by `tecbook --version`.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=TECBOOK_BUILD_VERSION");

    let package = env!("CARGO_PKG_VERSION");
    let version = match std::env::var("TECBOOK_BUILD_VERSION") {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => match git_commit() {
            Some(commit) => format!("{} ({})", package, commit),
            None => package.to_string(),
        },
    };

    println!("cargo:rustc-env=TECBOOK_VERSION={}", version);
}

/// Short commit hash, with `-dirty` when the tree has local changes.
fn git_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--exclude", "*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let commit = String::from_utf8(output.stdout).ok()?;
    let commit = commit.trim();
    (!commit.is_empty()).then(|| commit.to_string())
}
