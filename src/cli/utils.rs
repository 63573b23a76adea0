use std::io::Read;

use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::error::ClientError;
use crate::resources::Page;
use crate::session::Gate;
use crate::AdminClient;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a single backend payload
pub fn output_value(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => match value {
            Value::Object(map) => {
                for (key, field) in map {
                    println!("{}: {}", key, display_scalar(field));
                }
            }
            Value::Null => println!("(empty)"),
            other => println!("{}", display_scalar(other)),
        },
    }
    Ok(())
}

/// Output one page of a list call
pub fn output_page(output_format: &OutputFormat, page: &Page, page_number: u32) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "total": page.total,
                    "items": page.items,
                }))?
            );
        }
        OutputFormat::Text => {
            if page.items.is_empty() {
                println!("No results (total {})", page.total);
                return Ok(());
            }
            for item in &page.items {
                println!("{}", summarize(item));
            }
            println!("-- page {}, {} of {} shown", page_number, page.items.len(), page.total);
        }
    }
    Ok(())
}

/// `#id  label` for the text listing; the label is the first name-like field present
fn summarize(item: &Value) -> String {
    const LABEL_FIELDS: [&str; 6] = ["nom", "name", "email", "titre", "title", "description"];

    let id = item.get("id").map(display_scalar).unwrap_or_else(|| "-".to_string());
    let label = LABEL_FIELDS
        .iter()
        .find_map(|f| item.get(*f).and_then(Value::as_str))
        .unwrap_or("");
    format!("#{:<6} {}", id, label)
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Read a JSON document from stdin
pub fn read_stdin_json() -> anyhow::Result<Value> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    parse_json_input(&input)
}

pub fn parse_json_input(input: &str) -> anyhow::Result<Value> {
    if input.trim().is_empty() {
        return Err(ClientError::InvalidPayload("expected a JSON document on stdin".to_string()).into());
    }
    serde_json::from_str(input)
        .map_err(|e| ClientError::InvalidPayload(format!("stdin is not valid JSON: {}", e)).into())
}

/// Protected-view gate: refuse to run without a stored session
pub fn ensure_logged_in(client: &AdminClient) -> anyhow::Result<()> {
    match client.session().require_authenticated() {
        Gate::Allow => Ok(()),
        Gate::RedirectToLogin => Err(anyhow::anyhow!("Not logged in. Run `dimfaso auth login <email>` first")),
    }
}

/// React to a failed call: a rejected credential ends the local session
pub async fn handle_call_error(client: &AdminClient, error: ClientError) -> anyhow::Error {
    if error.is_unauthorized() {
        // The remote logout will most likely be refused too; the local clear is what matters
        if let Err(e) = client.session().logout().await {
            tracing::debug!("Logout after rejected credential: {}", e);
        }
        return anyhow::anyhow!("Session expired or rejected. Run `dimfaso auth login <email>` again");
    }

    match error.detail() {
        Some(detail) if !error.is_transport() => {
            anyhow::anyhow!("{} ({})", detail, error.error_code())
        }
        _ => error.into(),
    }
}
