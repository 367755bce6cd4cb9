//! Profile management commands
//!
//! Store, list, and remove named application profiles.

use clap::Subcommand;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::Formatter;
use sc_core::{AppProfile, ProfileManager};

/// Profile management subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or replace a profile
    Add(AddArgs),

    /// List stored profiles
    #[command(name = "ls", alias = "list")]
    List,

    /// Remove a profile
    #[command(name = "rm", alias = "remove")]
    Remove(RemoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Profile name
    pub name: String,

    /// Application id
    pub app_id: String,

    /// Application key
    pub app_key: String,

    /// API endpoint URL
    pub endpoint: String,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Profile name to remove
    pub name: String,
}

/// JSON output for profile list
#[derive(Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileInfo>,
}

/// JSON representation of a profile (the app key is never echoed)
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileInfo {
    name: String,
    app_id: String,
    endpoint: String,
}

impl From<&AppProfile> for ProfileInfo {
    fn from(profile: &AppProfile) -> Self {
        Self {
            name: profile.name.clone(),
            app_id: profile.app_id.clone(),
            endpoint: profile.endpoint.clone(),
        }
    }
}

/// Execute a profile subcommand
pub fn execute(cmd: ProfileCommands, formatter: &Formatter) -> ExitCode {
    match cmd {
        ProfileCommands::Add(args) => execute_add(args, formatter),
        ProfileCommands::List => execute_list(formatter),
        ProfileCommands::Remove(args) => execute_remove(args, formatter),
    }
}

fn open_manager(formatter: &Formatter) -> Result<ProfileManager, ExitCode> {
    ProfileManager::new().map_err(|e| {
        formatter.error(&format!("Failed to open profile store: {e}"));
        ExitCode::GeneralError
    })
}

fn execute_add(args: AddArgs, formatter: &Formatter) -> ExitCode {
    let mut manager = match open_manager(formatter) {
        Ok(m) => m,
        Err(code) => return code,
    };

    let profile = AppProfile {
        name: args.name.clone(),
        app_id: args.app_id,
        app_key: args.app_key,
        endpoint: args.endpoint,
    };
    match manager.set(profile) {
        Ok(()) => {
            let styled = formatter.style_name(&args.name);
            formatter.success(&format!("Profile '{styled}' saved."));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to save profile: {e}"));
            ExitCode::GeneralError
        }
    }
}

fn execute_list(formatter: &Formatter) -> ExitCode {
    let manager = match open_manager(formatter) {
        Ok(m) => m,
        Err(code) => return code,
    };

    let profiles = manager.list();
    if formatter.is_json() {
        let output = ProfileListOutput {
            profiles: profiles.into_iter().map(ProfileInfo::from).collect(),
        };
        formatter.json(&output);
    } else if profiles.is_empty() {
        formatter.println("No profiles stored.");
    } else {
        for profile in profiles {
            let name = formatter.style_name(&profile.name);
            let endpoint = formatter.style_uri(&profile.endpoint);
            formatter.println(&format!("{name} ({}) {endpoint}", profile.app_id));
        }
    }
    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, formatter: &Formatter) -> ExitCode {
    let mut manager = match open_manager(formatter) {
        Ok(m) => m,
        Err(code) => return code,
    };

    match manager.remove(&args.name) {
        Ok(_) => {
            let styled = formatter.style_name(&args.name);
            formatter.success(&format!("Profile '{styled}' removed."));
            ExitCode::Success
        }
        Err(sc_core::Error::ProfileNotFound(_)) => {
            formatter.error(&format!("Profile '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&format!("Failed to remove profile: {e}"));
            ExitCode::GeneralError
        }
    }
}
