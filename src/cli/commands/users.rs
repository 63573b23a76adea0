use clap::Subcommand;

use crate::cli::commands::resource::{self, CrudCommands};
use crate::cli::utils::{ensure_logged_in, handle_call_error, output_value, read_stdin_json};
use crate::cli::OutputFormat;
use crate::AdminClient;

#[derive(Subcommand)]
pub enum UsersCommands {
    #[command(flatten)]
    Crud(CrudCommands),

    #[command(about = "Show the connected user")]
    Me,

    #[command(about = "Show the client profile linked to a user")]
    ClientProfile {
        #[arg(help = "User ID")]
        user_id: String,
    },

    #[command(about = "Show the technician profile linked to a user")]
    TechnicienProfile {
        #[arg(help = "User ID")]
        user_id: String,
    },

    #[command(about = "Set a user's password from a JSON document on stdin")]
    SetPassword {
        #[arg(help = "User ID")]
        user_id: String,
    },

    #[command(about = "List available roles")]
    Roles,
}

pub async fn handle(client: &AdminClient, cmd: UsersCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let users = client.users();

    let result = match cmd {
        UsersCommands::Crud(cmd) => return resource::handle(client, users.users(), cmd, output_format).await,
        UsersCommands::Me => {
            ensure_logged_in(client)?;
            users.me().await
        }
        UsersCommands::ClientProfile { user_id } => {
            ensure_logged_in(client)?;
            users
                .client_profile_of(&user_id)
                .await
                .map(|profile| profile.unwrap_or_default())
        }
        UsersCommands::TechnicienProfile { user_id } => {
            ensure_logged_in(client)?;
            users
                .technicien_profile_of(&user_id)
                .await
                .map(|profile| profile.unwrap_or_default())
        }
        UsersCommands::SetPassword { user_id } => {
            ensure_logged_in(client)?;
            users.change_user_password(&user_id, read_stdin_json()?).await
        }
        UsersCommands::Roles => {
            ensure_logged_in(client)?;
            users.roles().await
        }
    };

    match result {
        Ok(value) => output_value(&output_format, &value),
        Err(e) => Err(handle_call_error(client, e).await),
    }
}
