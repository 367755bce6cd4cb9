//! Application context
//!
//! Every SDK entry point takes an explicit [`AppContext`] rather than
//! reading an ambient "current application" singleton. The context is the
//! tenant identity: app id, app key, and the API endpoint.

use url::Url;

use crate::error::{Error, Result};

/// Immutable application credentials and endpoint
#[derive(Debug, Clone)]
pub struct AppContext {
    app_id: String,
    app_key: String,
    endpoint: Url,
}

impl AppContext {
    /// Create a context from credentials and an endpoint URL string
    pub fn new(
        app_id: impl Into<String>,
        app_key: impl Into<String>,
        endpoint: &str,
    ) -> Result<Self> {
        let app_id = app_id.into();
        if app_id.is_empty() {
            return Err(Error::Config("app id cannot be empty".to_string()));
        }
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "endpoint must be http(s), got '{}'",
                endpoint.scheme()
            )));
        }
        Ok(Self {
            app_id,
            app_key: app_key.into(),
            endpoint,
        })
    }

    /// Application id (tenant identifier)
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Application key
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// API endpoint base URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build an app-scoped API path: `/apps/{app_id}{suffix}`
    ///
    /// `suffix` must be empty or start with `/`.
    pub fn api_path(&self, suffix: &str) -> String {
        format!("/apps/{}{suffix}", self.app_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_new() {
        let ctx = AppContext::new("app1", "key1", "https://api.stratus.example").unwrap();
        assert_eq!(ctx.app_id(), "app1");
        assert_eq!(ctx.app_key(), "key1");
        assert_eq!(ctx.endpoint().as_str(), "https://api.stratus.example/");
    }

    #[test]
    fn test_context_rejects_empty_app_id() {
        assert!(AppContext::new("", "key", "https://api.stratus.example").is_err());
    }

    #[test]
    fn test_context_rejects_bad_endpoint() {
        assert!(AppContext::new("app1", "key", "not a url").is_err());
        assert!(AppContext::new("app1", "key", "ftp://api.stratus.example").is_err());
    }

    #[test]
    fn test_api_path() {
        let ctx = AppContext::new("app1", "key1", "https://api.stratus.example").unwrap();
        assert_eq!(ctx.api_path("/users/u1"), "/apps/app1/users/u1");
        assert_eq!(ctx.api_path(""), "/apps/app1");
    }
}
