//! Session subcommand implementations.

mod adopt_token;
mod login;
mod login_google;
mod logout;
mod refresh_token;
mod status;
mod whoami;

use anyhow::Result;
use clap::{Args, Subcommand};

use tecbook_http::LoginOutcome;

use crate::cli::GlobalArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct SessionCommand {
    #[command(subcommand)]
    pub command: SessionSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionSubcommand {
    /// Log in with institutional email and password
    Login(login::LoginArgs),

    /// Log in by exchanging a Google ID token
    LoginGoogle(login_google::LoginGoogleArgs),

    /// Install a token obtained elsewhere (for example an OAuth redirect)
    AdoptToken(adopt_token::AdoptTokenArgs),

    /// Log out and revoke the refresh token
    Logout(logout::LogoutArgs),

    /// Refresh the access token
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Display the stored session
    Status(status::StatusArgs),

    /// Display the signed-in user
    Whoami(whoami::WhoamiArgs),
}

pub async fn handle(cmd: SessionCommand, global: &GlobalArgs) -> Result<()> {
    match cmd.command {
        SessionSubcommand::Login(args) => login::run(args, global).await,
        SessionSubcommand::LoginGoogle(args) => login_google::run(args, global).await,
        SessionSubcommand::AdoptToken(args) => adopt_token::run(args, global).await,
        SessionSubcommand::Logout(args) => logout::run(args, global).await,
        SessionSubcommand::RefreshToken(args) => refresh_token::run(args, global).await,
        SessionSubcommand::Status(args) => status::run(args, global).await,
        SessionSubcommand::Whoami(args) => whoami::run(args, global).await,
    }
}

/// Shared output for both login flavours.
fn print_login(outcome: &LoginOutcome) {
    match &outcome.identity {
        Some(identity) => {
            let name = if identity.display_name.is_empty() {
                identity.email.as_str()
            } else {
                identity.display_name.as_str()
            };
            output::success(&format!("Logged in as {}", name));
            println!();
            output::field("Email", &identity.email);
            output::field("Role", identity.role.as_str());
        }
        None => output::success("Logged in successfully"),
    }

    if outcome.requires_completion {
        output::warning("Profile incomplete; finish registration before using the app.");
    }
    if let Some(redirect) = &outcome.redirect_to {
        output::field("Next", redirect);
    }
}
