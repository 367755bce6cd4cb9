//! login command - Establish a session and print the token
//!
//! The printed token can be exported as STRATUS_TOKEN for subsequent
//! commands.

use clap::Args;
use serde::Serialize;

use crate::commands::get_client;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Log in and print a session token
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Profile naming the application to talk to
    pub profile: String,

    /// Username
    pub username: String,

    /// Password (prefer passing via STRATUS_PASSWORD)
    #[arg(long, env = "STRATUS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginOutput {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

/// Execute the login command
pub async fn execute(args: LoginArgs, formatter: &Formatter) -> ExitCode {
    let client = match get_client(&args.profile, None, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.login(&args.username, &args.password).await {
        Ok(session) => {
            if formatter.is_json() {
                formatter.json(&LoginOutput {
                    access_token: session.access_token,
                    user_id: session.user_id,
                });
            } else {
                formatter.success(&format!("Logged in as '{}'.", args.username));
                formatter.println(&session.access_token);
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Login failed: {e}"));
            ExitCode::from_error(&e)
        }
    }
}
