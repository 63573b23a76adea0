use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{handle_call_error, output_success, output_value, read_stdin_json};
use crate::cli::OutputFormat;
use crate::session::{Credentials, SessionState};
use crate::AdminClient;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login with email and password")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the stored token")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Register a new account from a JSON document on stdin")]
    Register,
}

pub async fn handle(client: &AdminClient, cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };

            let credentials = Credentials::new(email.clone(), password);
            if let Err(e) = client.session().login(&credentials).await {
                // A refused login leaves nothing to log out of
                return Err(match e.detail() {
                    Some(detail) => anyhow::anyhow!("Login failed: {}", detail),
                    None => anyhow::anyhow!("Login failed: {}", e),
                });
            }

            output_success(
                &output_format,
                &format!("Logged in as {}", email),
                Some(json!({ "email": email })),
            )
        }
        AuthCommands::Logout => {
            let result = client.session().logout().await;
            if let Err(e) = &result {
                tracing::warn!("Remote logout failed: {}", e);
            }
            output_success(
                &output_format,
                "Logged out",
                Some(json!({ "remote_logout": result.is_ok() })),
            )
        }
        AuthCommands::Status => {
            let state = client.session().state();
            let message = match state {
                SessionState::Authenticated => "Authenticated",
                SessionState::Anonymous => "Not logged in",
            };
            output_success(&output_format, message, Some(json!({ "state": state })))
        }
        AuthCommands::Register => {
            let payload = read_stdin_json()?;
            match client.session().register(payload).await {
                Ok(account) => output_value(&output_format, &account),
                Err(e) => Err(handle_call_error(client, e).await),
            }
        }
    }
}

fn read_password() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("No password given; pass --password or pipe it on stdin");
    }
    Ok(password)
}
