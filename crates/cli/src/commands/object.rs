//! object command - Work with objects
//!
//! Fetch, mutate, delete, and relocate objects addressed by stratus://
//! uris. Writes go through the optimistic-concurrency engine; pass
//! `--conditional` to require a version match instead of overwriting.

use std::time::Duration;

use bytes::Bytes;
use clap::{Args, Subcommand};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::commands::{get_client, parse_field};
use crate::exit_code::ExitCode;
use crate::output::Formatter;
use sc_core::{ObjectHandle, Uri};
use sc_rest::RestClient;

/// Work with objects
#[derive(Args, Debug)]
pub struct ObjectArgs {
    #[command(subcommand)]
    pub command: ObjectCommands,
}

#[derive(Subcommand, Debug)]
pub enum ObjectCommands {
    /// Fetch an object and show its fields
    Get(GetArgs),

    /// Stage field values and save the object
    Set(SetArgs),

    /// Delete an object
    #[command(name = "rm", alias = "remove")]
    Remove(AddressArgs),

    /// Show the ACL entries of an object
    Acl(AddressArgs),

    /// Upload the binary body of an object
    #[command(name = "put-body")]
    PutBody(PutBodyArgs),

    /// Download the binary body of an object
    #[command(name = "get-body")]
    GetBody(GetBodyArgs),

    /// Move the binary body of an object to another object
    #[command(name = "move-body")]
    MoveBody(MoveBodyArgs),
}

#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Profile naming the application to talk to
    pub profile: String,

    /// Object address (stratus://.../objects/...)
    pub address: String,

    /// Session token (falls back to the STRATUS_TOKEN environment variable)
    #[arg(long, env = "STRATUS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub target: AddressArgs,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub target: AddressArgs,

    /// Fields to stage (KEY=VALUE; values parse as JSON when possible)
    #[arg(required = true, value_name = "KEY=VALUE", num_args = 1..)]
    pub fields: Vec<String>,

    /// Send the full merged document instead of a patch
    #[arg(long)]
    pub full: bool,

    /// Require a version match instead of overwriting unconditionally
    #[arg(long)]
    pub conditional: bool,
}

#[derive(Args, Debug)]
pub struct PutBodyArgs {
    #[command(flatten)]
    pub target: AddressArgs,

    /// File to upload
    pub file: std::path::PathBuf,

    /// Media type (guessed from the file name when omitted)
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Args, Debug)]
pub struct GetBodyArgs {
    #[command(flatten)]
    pub target: AddressArgs,

    /// File to write the body to
    pub file: std::path::PathBuf,
}

#[derive(Args, Debug)]
pub struct MoveBodyArgs {
    /// Profile naming the application to talk to
    pub profile: String,

    /// Source object address
    pub source: String,

    /// Target object address
    pub target: String,

    /// Session token (falls back to the STRATUS_TOKEN environment variable)
    #[arg(long, env = "STRATUS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// JSON output for object get
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectOutput {
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified_at: Option<String>,
    fields: sc_core::Document,
}

impl ObjectOutput {
    fn from_handle(address: &str, object: &ObjectHandle) -> Self {
        Self {
            address: address.to_string(),
            id: object.id().map(str::to_string),
            version: object.version().map(str::to_string),
            created_at: object.created_at().map(|t| t.to_string()),
            modified_at: object.modified_at().map(|t| t.to_string()),
            fields: object.committed().clone(),
        }
    }
}

/// Execute an object subcommand
pub async fn execute(args: ObjectArgs, formatter: &Formatter) -> ExitCode {
    match args.command {
        ObjectCommands::Get(args) => execute_get(args, formatter).await,
        ObjectCommands::Set(args) => execute_set(args, formatter).await,
        ObjectCommands::Remove(args) => execute_remove(args, formatter).await,
        ObjectCommands::Acl(args) => execute_acl(args, formatter).await,
        ObjectCommands::PutBody(args) => execute_put_body(args, formatter).await,
        ObjectCommands::GetBody(args) => execute_get_body(args, formatter).await,
        ObjectCommands::MoveBody(args) => execute_move_body(args, formatter).await,
    }
}

/// Resolve an address that must terminate in an object
fn resolve_object(address: &str, formatter: &Formatter) -> Result<ObjectHandle, ExitCode> {
    match sc_core::uri::resolve(address).and_then(sc_core::Resource::into_object) {
        Ok(object) => Ok(object),
        Err(e) => {
            formatter.error(&format!("Bad object address: {e}"));
            Err(ExitCode::UsageError)
        }
    }
}

fn setup(
    target: &AddressArgs,
    formatter: &Formatter,
) -> Result<(RestClient, ObjectHandle), ExitCode> {
    let object = resolve_object(&target.address, formatter)?;
    let client = get_client(&target.profile, target.token.as_deref(), formatter)?;
    Ok((client, object))
}

fn progress(formatter: &Formatter, message: &str) -> ProgressBar {
    if formatter.is_json() || formatter.is_quiet() || !formatter.colors_enabled() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static template is valid"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn execute_get(args: GetArgs, formatter: &Formatter) -> ExitCode {
    let (client, mut object) = match setup(&args.target, formatter) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    if let Err(e) = object.refresh(client.context(), &client).await {
        formatter.error(&format!("Failed to fetch object: {e}"));
        return ExitCode::from_error(&e);
    }

    if formatter.is_json() {
        formatter.json(&ObjectOutput::from_handle(&args.target.address, &object));
        return ExitCode::Success;
    }

    formatter.println(&formatter.style_uri(&args.target.address));
    if let Some(version) = object.version() {
        formatter.println(&format!(
            "{} {}",
            formatter.style_key("version:"),
            formatter.style_date(version)
        ));
    }
    if let Some(modified) = object.modified_at() {
        formatter.println(&format!(
            "{} {}",
            formatter.style_key("modified:"),
            formatter.style_date(&modified.to_string())
        ));
    }

    let mut table = Table::new();
    table.set_header(["Field", "Value"]);
    for (key, value) in object.committed().iter() {
        table.add_row([key.clone(), value.to_string()]);
    }
    formatter.println(&table.to_string());
    ExitCode::Success
}

async fn execute_set(args: SetArgs, formatter: &Formatter) -> ExitCode {
    let (client, mut object) = match setup(&args.target, formatter) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    for raw in &args.fields {
        let (key, value) = match parse_field(raw) {
            Ok(pair) => pair,
            Err(e) => {
                formatter.error(&format!("{e:#}"));
                return ExitCode::UsageError;
            }
        };
        if let Err(e) = object.set(&key, value) {
            formatter.error(&format!("Cannot stage field: {e}"));
            return ExitCode::UsageError;
        }
    }

    let overwrite = !args.conditional;
    let result = if args.full {
        object.save_all_fields(client.context(), &client, overwrite).await
    } else {
        object.save(client.context(), &client, overwrite).await
    };

    match result {
        Ok(()) => {
            let address = match object.uri() {
                Ok(uri) => uri.to_string(),
                Err(_) => args.target.address.clone(),
            };
            if formatter.is_json() {
                formatter.json(&ObjectOutput::from_handle(&address, &object));
            } else {
                formatter.success(&format!("Saved {}", formatter.style_uri(&address)));
            }
            ExitCode::Success
        }
        Err(e) => {
            if e.is_conflict() {
                formatter.error(&format!(
                    "Version conflict: {e}. Refresh the object and retry."
                ));
            } else {
                formatter.error(&format!("Failed to save object: {e}"));
            }
            ExitCode::from_error(&e)
        }
    }
}

async fn execute_remove(args: AddressArgs, formatter: &Formatter) -> ExitCode {
    let (client, mut object) = match setup(&args, formatter) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    match object.delete(client.context(), &client).await {
        Ok(()) => {
            formatter.success(&format!("Deleted {}", formatter.style_uri(&args.address)));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to delete object: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn execute_acl(args: AddressArgs, formatter: &Formatter) -> ExitCode {
    let (client, object) = match setup(&args, formatter) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    match client.object_acl(&object).await {
        Ok(entries) => {
            if formatter.is_json() {
                let output: Vec<_> = entries
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "action": e.action.as_str(),
                            "subject": e.subject.path_fragment(),
                        })
                    })
                    .collect();
                formatter.json(&output);
            } else if entries.is_empty() {
                formatter.println("No ACL entries.");
            } else {
                for entry in entries {
                    formatter.println(&format!(
                        "{} {}",
                        formatter.style_key(entry.action.as_str()),
                        entry.subject.path_fragment()
                    ));
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to fetch acl: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn execute_put_body(args: PutBodyArgs, formatter: &Formatter) -> ExitCode {
    let (client, object) = match setup(&args.target, formatter) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    let data = match std::fs::read(&args.file) {
        Ok(data) => data,
        Err(e) => {
            formatter.error(&format!("Cannot read {}: {e}", args.file.display()));
            return ExitCode::GeneralError;
        }
    };
    let content_type = args.content_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(&args.file)
            .first_or_octet_stream()
            .to_string()
    });
    let size = data.len() as u64;

    let pb = progress(formatter, "uploading body");
    let result = client
        .upload_body(&object, &content_type, Bytes::from(data))
        .await;
    pb.finish_and_clear();

    match result {
        Ok(()) => {
            formatter.success(&format!(
                "Uploaded {} ({content_type}) to {}",
                humansize::format_size(size, humansize::BINARY),
                formatter.style_uri(&args.target.address)
            ));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to upload body: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn execute_get_body(args: GetBodyArgs, formatter: &Formatter) -> ExitCode {
    let (client, object) = match setup(&args.target, formatter) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    let pb = progress(formatter, "downloading body");
    let result = client.download_body(&object).await;
    pb.finish_and_clear();

    let body = match result {
        Ok(body) => body,
        Err(e) => {
            formatter.error(&format!("Failed to download body: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    if let Err(e) = std::fs::write(&args.file, &body.data) {
        formatter.error(&format!("Cannot write {}: {e}", args.file.display()));
        return ExitCode::GeneralError;
    }
    formatter.success(&format!(
        "Downloaded {} ({}) to {}",
        humansize::format_size(body.data.len() as u64, humansize::BINARY),
        body.content_type,
        args.file.display()
    ));
    ExitCode::Success
}

async fn execute_move_body(args: MoveBodyArgs, formatter: &Formatter) -> ExitCode {
    let source = match resolve_object(&args.source, formatter) {
        Ok(object) => object,
        Err(code) => return code,
    };
    let target_uri = match Uri::parse(&args.target) {
        Ok(uri) => uri,
        Err(e) => {
            formatter.error(&format!("Bad target address: {e}"));
            return ExitCode::UsageError;
        }
    };
    let client = match get_client(&args.profile, args.token.as_deref(), formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    match client.move_body(&source, &target_uri).await {
        Ok(()) => {
            formatter.success(&format!(
                "Moved body of {} to {}",
                formatter.style_uri(&args.source),
                formatter.style_uri(&args.target)
            ));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to move body: {e}"));
            ExitCode::from_error(&e)
        }
    }
}
