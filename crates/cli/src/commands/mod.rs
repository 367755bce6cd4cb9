//! CLI command implementations

pub mod call;
pub mod completions;
pub mod group;
pub mod login;
pub mod object;
pub mod profile;
pub mod uri;

use anyhow::{Context as _, bail};
use serde_json::Value;

use crate::exit_code::ExitCode;
use crate::output::Formatter;
use sc_core::{AppContext, ProfileManager};
use sc_rest::RestClient;

/// Resolve a stored profile into an application context
pub fn get_context(profile: &str, formatter: &Formatter) -> Result<AppContext, ExitCode> {
    let manager = match ProfileManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to load profiles: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    let stored = match manager.get(profile) {
        Ok(p) => p.clone(),
        Err(sc_core::Error::ProfileNotFound(_)) => {
            formatter.error(&format!("Profile '{profile}' not found"));
            return Err(ExitCode::NotFound);
        }
        Err(e) => {
            formatter.error(&format!("Failed to load profile: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    match stored.context() {
        Ok(ctx) => {
            tracing::debug!(profile = %profile, app_id = %ctx.app_id(), "profile loaded");
            Ok(ctx)
        }
        Err(e) => {
            formatter.error(&format!("Invalid profile '{profile}': {e}"));
            Err(ExitCode::GeneralError)
        }
    }
}

/// Build a REST client for a profile, attaching a session token when given
pub fn get_client(
    profile: &str,
    token: Option<&str>,
    formatter: &Formatter,
) -> Result<RestClient, ExitCode> {
    let ctx = get_context(profile, formatter)?;
    let client = match RestClient::new(ctx) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create client: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };
    if let Some(token) = token {
        client.set_token(token);
    }
    Ok(client)
}

/// Parse a KEY=VALUE argument
///
/// Values parse as JSON first so numbers, booleans, and nested structures
/// work; anything that is not valid JSON becomes a string.
pub fn parse_field(raw: &str) -> anyhow::Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        bail!("field key cannot be empty in '{raw}'");
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_field_json_values() {
        assert_eq!(parse_field("n=3").unwrap(), ("n".to_string(), json!(3)));
        assert_eq!(
            parse_field("flag=true").unwrap(),
            ("flag".to_string(), json!(true))
        );
        assert_eq!(
            parse_field("tags=[1,2]").unwrap(),
            ("tags".to_string(), json!([1, 2]))
        );
    }

    #[test]
    fn test_parse_field_string_fallback() {
        assert_eq!(
            parse_field("title=hello world").unwrap(),
            ("title".to_string(), json!("hello world"))
        );
        // Values containing '=' split only on the first one
        assert_eq!(
            parse_field("eq=a=b").unwrap(),
            ("eq".to_string(), json!("a=b"))
        );
    }

    #[test]
    fn test_parse_field_rejects_bad_input() {
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }
}
