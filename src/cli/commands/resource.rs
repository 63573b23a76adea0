use clap::{Args, Subcommand};

use crate::cli::utils::{
    ensure_logged_in, handle_call_error, output_page, output_success, output_value, read_stdin_json,
};
use crate::cli::OutputFormat;
use crate::resources::{Collection, ListParams};
use crate::AdminClient;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1, help = "Page number (1-based)")]
    pub page: u32,
    #[arg(long, default_value_t = 10, help = "Items per page")]
    pub page_size: u32,
    #[arg(long, help = "Free-text search")]
    pub search: Option<String>,
    #[arg(long, allow_hyphen_values = true, help = "Ordering field, prefix with - for descending")]
    pub ordering: Option<String>,
}

impl ListArgs {
    pub fn to_params(&self) -> ListParams {
        ListParams {
            page: self.page,
            page_size: self.page_size,
            search: self.search.clone(),
            ordering: self.ordering.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CrudCommands {
    #[command(about = "List one page of records")]
    List(ListArgs),

    #[command(about = "Show one record")]
    Get {
        #[arg(help = "Record ID")]
        id: String,
    },

    #[command(about = "Create record from stdin")]
    Create,

    #[command(about = "Update record from stdin")]
    Update {
        #[arg(help = "Record ID to update")]
        id: String,
        #[arg(long, help = "Send only the given fields (PATCH) instead of replacing")]
        partial: bool,
    },

    #[command(about = "Delete record")]
    Delete {
        #[arg(help = "Record ID to delete")]
        id: String,
    },
}

pub async fn handle(
    client: &AdminClient,
    collection: Collection,
    cmd: CrudCommands,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    ensure_logged_in(client)?;

    let result = match cmd {
        CrudCommands::List(args) => {
            let params = args.to_params();
            match collection.list(&params).await {
                Ok(page) => return output_page(&output_format, &page, params.page),
                Err(e) => Err(e),
            }
        }
        CrudCommands::Get { id } => collection.get(&id).await,
        CrudCommands::Create => collection.create(read_stdin_json()?).await,
        CrudCommands::Update { id, partial } => {
            let payload = read_stdin_json()?;
            if partial {
                collection.partial_update(&id, payload).await
            } else {
                collection.update(&id, payload).await
            }
        }
        CrudCommands::Delete { id } => match collection.delete(&id).await {
            Ok(()) => {
                return output_success(&output_format, &format!("Deleted {}{}/", collection.path(), id), None)
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(record) => output_value(&output_format, &record),
        Err(e) => Err(handle_call_error(client, e).await),
    }
}
