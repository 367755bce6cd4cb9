//! call command - Invoke a server-code endpoint

use anyhow::Context as _;
use clap::Args;

use crate::commands::get_client;
use crate::exit_code::ExitCode;
use crate::output::Formatter;
use sc_core::Document;

/// Invoke a server-code endpoint
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Profile naming the application to talk to
    pub profile: String,

    /// Endpoint name
    pub endpoint: String,

    /// Argument document as a JSON object
    #[arg(long, value_name = "JSON")]
    pub args_json: Option<String>,

    /// Server-code version to run (defaults to the current one)
    #[arg(long)]
    pub code_version: Option<String>,

    /// Session token (falls back to the STRATUS_TOKEN environment variable)
    #[arg(long, env = "STRATUS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

fn parse_args_document(raw: Option<&str>) -> anyhow::Result<Document> {
    match raw {
        None => Ok(Document::new()),
        Some(raw) => serde_json::from_str::<Document>(raw)
            .with_context(|| format!("--args-json is not a JSON object: {raw}")),
    }
}

/// Execute the call command
pub async fn execute(args: CallArgs, formatter: &Formatter) -> ExitCode {
    let arguments = match parse_args_document(args.args_json.as_deref()) {
        Ok(doc) => doc,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::UsageError;
        }
    };

    let client = match get_client(&args.profile, args.token.as_deref(), formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client
        .execute_endpoint(&args.endpoint, args.code_version.as_deref(), &arguments)
        .await
    {
        Ok(result) => {
            formatter.json(&result);
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to invoke '{}': {e}", args.endpoint));
            ExitCode::from_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_document() {
        assert!(parse_args_document(None).unwrap().is_empty());
        let doc = parse_args_document(Some(r#"{"n": 3}"#)).unwrap();
        assert_eq!(doc.get("n"), Some(&serde_json::json!(3)));
        assert!(parse_args_document(Some("[1,2]")).is_err());
        assert!(parse_args_document(Some("not json")).is_err());
    }
}
