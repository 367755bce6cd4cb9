//! Server-side code invocation
//!
//! Executes a named endpoint of the application's deployed server code with
//! a document argument and returns the result document.

use sc_core::{ApiRequest, Document, Result, Transport};

use crate::client::RestClient;

/// Version label resolving to the currently deployed server code
pub const CURRENT_VERSION: &str = "current";

impl RestClient {
    /// Invoke a server-code endpoint
    ///
    /// `version` selects a deployed code version; `None` runs the current
    /// one.
    pub async fn execute_endpoint(
        &self,
        name: &str,
        version: Option<&str>,
        args: &Document,
    ) -> Result<Document> {
        let version = version.unwrap_or(CURRENT_VERSION);
        let path = self.context().api_path(&format!(
            "/server-code/versions/{}/{}",
            urlencoding::encode(version),
            urlencoding::encode(name)
        ));
        let response = self
            .send(ApiRequest::post(path, args.to_value()))
            .await?
            .check()?;

        serde_json::from_slice::<Document>(&response.body).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_document_parsing() {
        let doc: Document =
            serde_json::from_str(r#"{"returnedValue": {"ok": true}, "x_step": 3}"#).unwrap();
        assert!(doc.get("returnedValue").is_some());
        assert_eq!(doc.len(), 2);
    }
}
