pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::session::FileStore;
use crate::AdminClient;

#[derive(Parser)]
#[command(name = "dimfaso")]
#[command(about = "Dimfaso admin CLI - users, catalog, installations and maintenance")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, logout and session status")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "User accounts and profiles")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UsersCommands,
    },

    #[command(about = "Equipment categories")]
    Categories {
        #[command(subcommand)]
        cmd: commands::resource::CrudCommands,
    },

    #[command(about = "Equipment brands")]
    Marques {
        #[command(subcommand)]
        cmd: commands::resource::CrudCommands,
    },

    #[command(about = "Solar equipment catalog")]
    Equipements {
        #[command(subcommand)]
        cmd: commands::resource::CrudCommands,
    },

    #[command(about = "Installation requests and proposals")]
    Installations {
        #[command(subcommand)]
        cmd: commands::resource::CrudCommands,
    },

    #[command(about = "Maintenance incidents")]
    Incidents {
        #[command(subcommand)]
        cmd: commands::resource::CrudCommands,
    },

    #[command(about = "Maintenance interventions")]
    Interventions {
        #[command(subcommand)]
        cmd: commands::resource::CrudCommands,
    },

    #[command(about = "Maintenance questionnaires")]
    Questions {
        #[command(subcommand)]
        cmd: commands::resource::CrudCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let config = AppConfig::from_env();
    tracing::debug!("Using {:?} configuration", config.environment);

    let store = FileStore::open_default(config.storage.dir.as_deref())?.shared();
    let client = AdminClient::new(&config, store)?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(&client, cmd, output_format).await,
        Commands::Users { cmd } => commands::users::handle(&client, cmd, output_format).await,
        Commands::Categories { cmd } => {
            commands::resource::handle(&client, client.products().categories(), cmd, output_format).await
        }
        Commands::Marques { cmd } => {
            commands::resource::handle(&client, client.products().marques(), cmd, output_format).await
        }
        Commands::Equipements { cmd } => {
            commands::resource::handle(&client, client.products().equipements(), cmd, output_format).await
        }
        Commands::Installations { cmd } => {
            let installations = client.installations().installations();
            commands::resource::handle(&client, installations, cmd, output_format).await
        }
        Commands::Incidents { cmd } => {
            commands::resource::handle(&client, client.maintenance().incidents(), cmd, output_format).await
        }
        Commands::Interventions { cmd } => {
            let interventions = client.maintenance().interventions();
            commands::resource::handle(&client, interventions, cmd, output_format).await
        }
        Commands::Questions { cmd } => {
            commands::resource::handle(&client, client.maintenance().questions(), cmd, output_format).await
        }
    }
}
