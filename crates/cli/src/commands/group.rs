//! group command - Manage groups and their members
//!
//! Create groups and stage membership edits through the same
//! optimistic-concurrency engine objects use.

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::commands::get_client;
use crate::exit_code::ExitCode;
use crate::output::Formatter;
use sc_core::GroupHandle;

/// Manage groups and their members
#[derive(Args, Debug)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommands,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Create a new group
    Create(CreateArgs),

    /// Show a group and its members
    Info(InfoArgs),

    /// Add members to a group
    #[command(name = "add-members")]
    AddMembers(MembersArgs),

    /// Remove members from a group
    #[command(name = "rm-members")]
    RemoveMembers(MembersArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Profile naming the application to talk to
    pub profile: String,

    /// Group name
    pub name: String,

    /// Initial members (comma-separated user ids)
    #[arg(long)]
    pub members: Option<String>,

    /// Session token (falls back to the STRATUS_TOKEN environment variable)
    #[arg(long, env = "STRATUS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Profile naming the application to talk to
    pub profile: String,

    /// Group id
    pub id: String,

    /// Session token (falls back to the STRATUS_TOKEN environment variable)
    #[arg(long, env = "STRATUS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Args, Debug)]
pub struct MembersArgs {
    /// Profile naming the application to talk to
    pub profile: String,

    /// Group id
    pub id: String,

    /// Members to add or remove (comma-separated user ids)
    pub members: String,

    /// Require a version match instead of overwriting unconditionally
    #[arg(long)]
    pub conditional: bool,

    /// Session token (falls back to the STRATUS_TOKEN environment variable)
    #[arg(long, env = "STRATUS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// JSON output for group operations
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    members: Vec<String>,
}

impl From<&GroupHandle> for GroupOutput {
    fn from(group: &GroupHandle) -> Self {
        Self {
            id: group.id().map(str::to_string),
            name: group.name().map(str::to_string),
            members: group.members().into_iter().collect(),
        }
    }
}

fn split_members(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Execute a group subcommand
pub async fn execute(args: GroupArgs, formatter: &Formatter) -> ExitCode {
    match args.command {
        GroupCommands::Create(args) => execute_create(args, formatter).await,
        GroupCommands::Info(args) => execute_info(args, formatter).await,
        GroupCommands::AddMembers(args) => execute_members(args, formatter, true).await,
        GroupCommands::RemoveMembers(args) => execute_members(args, formatter, false).await,
    }
}

async fn execute_create(args: CreateArgs, formatter: &Formatter) -> ExitCode {
    let client = match get_client(&args.profile, args.token.as_deref(), formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if args.name.is_empty() {
        formatter.error("Group name cannot be empty");
        return ExitCode::UsageError;
    }

    let mut group = GroupHandle::new(&args.name);
    if let Some(members) = &args.members {
        for member in split_members(members) {
            group.add_member(member);
        }
    }

    match group.save_members(client.context(), &client, true).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&GroupOutput::from(&group));
            } else {
                let styled = formatter.style_name(&args.name);
                let id = group.id().unwrap_or("?");
                formatter.success(&format!("Group '{styled}' created ({id})."));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to create group: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn execute_info(args: InfoArgs, formatter: &Formatter) -> ExitCode {
    let client = match get_client(&args.profile, args.token.as_deref(), formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut group = GroupHandle::with_id(&args.id);
    match group.refresh(client.context(), &client).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&GroupOutput::from(&group));
            } else {
                let name = group.name().unwrap_or("(unnamed)");
                formatter.println(&format!(
                    "{} {}",
                    formatter.style_name(name),
                    formatter.style_date(&args.id)
                ));
                let members = group.members();
                if members.is_empty() {
                    formatter.println("No members.");
                } else {
                    for member in members {
                        formatter.println(&format!("  {member}"));
                    }
                }
            }
            ExitCode::Success
        }
        Err(e) if e.is_not_found() => {
            formatter.error(&format!("Group '{}' not found", args.id));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&format!("Failed to fetch group: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn execute_members(args: MembersArgs, formatter: &Formatter, add: bool) -> ExitCode {
    let client = match get_client(&args.profile, args.token.as_deref(), formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let members = split_members(&args.members);
    if members.is_empty() {
        formatter.error("No members given");
        return ExitCode::UsageError;
    }

    let mut group = GroupHandle::with_id(&args.id);
    // Start from the server's member list so the full effective list we
    // send reflects concurrent state, and so a conditional save has a
    // version token to match.
    if let Err(e) = group.refresh(client.context(), &client).await {
        formatter.error(&format!("Failed to fetch group: {e}"));
        return ExitCode::from_error(&e);
    }

    for member in members {
        if add {
            group.add_member(member);
        } else {
            group.remove_member(&member);
        }
    }
    if !group.has_pending_changes() {
        formatter.warning("Membership already up to date; nothing to save.");
        return ExitCode::Success;
    }

    match group
        .save_members(client.context(), &client, !args.conditional)
        .await
    {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&GroupOutput::from(&group));
            } else {
                let verb = if add { "added to" } else { "removed from" };
                let styled = formatter.style_name(&args.id);
                formatter.success(&format!("Members {verb} group '{styled}'."));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to save members: {e}"));
            ExitCode::from_error(&e)
        }
    }
}
