//! uri command - Inspect a stratus:// address
//!
//! Parses and resolves an address without touching the network, and can
//! derive the body-transfer descriptor for object addresses.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::Formatter;
use sc_core::{Owner, Resource, TransferTarget, Uri};

/// Inspect a stratus:// address
#[derive(Args, Debug)]
pub struct UriArgs {
    /// Address to inspect (stratus://...)
    pub address: String,

    /// Also derive the body-transfer descriptor
    #[arg(long)]
    pub transfer: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UriOutput {
    address: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transfer: Option<TransferTarget>,
}

/// Execute the uri command
pub fn execute(args: UriArgs, formatter: &Formatter) -> ExitCode {
    let uri = match Uri::parse(&args.address) {
        Ok(uri) => uri,
        Err(e) => {
            formatter.error(&format!("Cannot parse address: {e}"));
            return ExitCode::UsageError;
        }
    };
    let resource = match uri.resolve() {
        Ok(resource) => resource,
        Err(e) => {
            formatter.error(&format!("Cannot resolve address: {e}"));
            return ExitCode::UsageError;
        }
    };

    let transfer = if args.transfer {
        match TransferTarget::from_uri(&uri) {
            Ok(target) => Some(target),
            Err(e) => {
                formatter.error(&format!("Cannot derive transfer target: {e}"));
                return ExitCode::UsageError;
            }
        }
    } else {
        None
    };

    let output = describe(&args.address, &resource, transfer);
    if formatter.is_json() {
        formatter.json(&output);
        return ExitCode::Success;
    }

    formatter.println(&format!(
        "{} {}",
        formatter.style_key("kind:"),
        formatter.style_name(output.kind)
    ));
    if let Some(id) = &output.id {
        formatter.println(&format!("{}   {id}", formatter.style_key("id:")));
    }
    if let Some(bucket) = &output.bucket {
        let kind = output.bucket_kind.unwrap_or("plain");
        formatter.println(&format!(
            "{} {bucket} ({kind})",
            formatter.style_key("bucket:")
        ));
    }
    if let Some(owner_kind) = output.owner_kind {
        let owner_id = output.owner_id.as_deref().unwrap_or("(unassigned)");
        formatter.println(&format!(
            "{} {owner_kind}/{owner_id}",
            formatter.style_key("owner:")
        ));
    }
    if let Some(target) = &output.transfer {
        match serde_json::to_string_pretty(target) {
            Ok(json) => formatter.println(&format!("{}\n{json}", formatter.style_key("transfer:"))),
            Err(e) => formatter.warning(&format!("Cannot render transfer target: {e}")),
        }
    }
    ExitCode::Success
}

fn describe(address: &str, resource: &Resource, transfer: Option<TransferTarget>) -> UriOutput {
    let mut output = UriOutput {
        address: address.to_string(),
        kind: resource.kind(),
        id: None,
        bucket: None,
        bucket_kind: None,
        owner_kind: None,
        owner_id: None,
        transfer,
    };

    let describe_owner = |output: &mut UriOutput, owner: Option<&Owner>| {
        if let Some(owner) = owner {
            output.owner_kind = Some(owner.kind());
            output.owner_id = owner.id().map(str::to_string);
        }
    };

    match resource {
        Resource::User(u) => output.id = u.id().map(str::to_string),
        Resource::Group(g) => output.id = g.id().map(str::to_string),
        Resource::Thing(t) => output.id = t.id().map(str::to_string),
        Resource::Bucket(b) => {
            output.bucket = Some(b.name().to_string());
            output.bucket_kind = Some(kind_str(b.kind()));
            describe_owner(&mut output, b.owner());
        }
        Resource::Object(o) => {
            output.id = o.id().map(str::to_string);
            output.bucket = Some(o.bucket().name().to_string());
            output.bucket_kind = Some(kind_str(o.bucket().kind()));
            describe_owner(&mut output, o.bucket().owner());
        }
    }
    output
}

fn kind_str(kind: sc_core::BucketKind) -> &'static str {
    match kind {
        sc_core::BucketKind::Plain => "plain",
        sc_core::BucketKind::Crypto => "crypto",
    }
}
