//! REST client implementation
//!
//! Wraps reqwest and implements the `Transport` trait from sc-core. Every
//! request carries the application credentials; a bearer token is attached
//! once a session has been established. HTTP responses come back as
//! `ApiResponse`s whatever their status; only failing to obtain a response
//! at all is an error here.

use std::sync::RwLock;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;

use sc_core::acl::{self, AclEntry};
use sc_core::{
    ApiRequest, ApiResponse, AppContext, Error, ObjectHandle, RequestBody, Result, Transport,
};

/// Request header carrying the application id
pub const APP_ID_HEADER: &str = "X-Stratus-AppID";
/// Request header carrying the application key
pub const APP_KEY_HEADER: &str = "X-Stratus-AppKey";

/// REST transport for the Stratus backend
pub struct RestClient {
    http: reqwest::Client,
    ctx: AppContext,
    token: RwLock<Option<String>>,
}

impl RestClient {
    /// Create a client for an application context
    pub fn new(ctx: AppContext) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stratus-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("cannot build http client: {e}")))?;
        Ok(Self {
            http,
            ctx,
            token: RwLock::new(None),
        })
    }

    /// The application context this client talks for
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// The current bearer token, if a session is established
    pub fn token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    /// Install a bearer token for subsequent requests
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = Some(token.into());
    }

    /// Drop the session token
    pub fn clear_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    /// Absolute URL for an API path
    pub(crate) fn request_url(&self, path: &str) -> String {
        format!(
            "{}{path}",
            self.ctx.endpoint().as_str().trim_end_matches('/')
        )
    }

    /// Fetch the ACL entries of an object
    pub async fn object_acl(&self, object: &ObjectHandle) -> Result<Vec<AclEntry>> {
        let path = format!("{}/acl", object.request_path(&self.ctx)?);
        let response = self.send(ApiRequest::get(path)).await?.check()?;
        acl::parse_entries(&response.json()?)
    }

    /// Grant one ACL entry on an object
    pub async fn grant(&self, object: &ObjectHandle, entry: &AclEntry) -> Result<()> {
        let path = format!(
            "{}/acl/{}/{}",
            object.request_path(&self.ctx)?,
            entry.action.as_str(),
            entry.subject.path_fragment()
        );
        self.send(ApiRequest::put_empty(path)).await?.check()?;
        Ok(())
    }

    /// Revoke one ACL entry on an object
    pub async fn revoke(&self, object: &ObjectHandle, entry: &AclEntry) -> Result<()> {
        let path = format!(
            "{}/acl/{}/{}",
            object.request_path(&self.ctx)?,
            entry.action.as_str(),
            entry.subject.path_fragment()
        );
        self.send(ApiRequest::delete(path)).await?.check()?;
        Ok(())
    }
}

#[async_trait]
impl Transport for RestClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.request_url(&request.path);
        tracing::trace!(method = %request.method, url = %url, "sending request");

        let mut builder = self
            .http
            .request(request.method, &url)
            .header(APP_ID_HEADER, self.ctx.app_id())
            .header(APP_KEY_HEADER, self.ctx.app_key());
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            Some(RequestBody::Json {
                content_type,
                value,
            }) => builder
                .header(CONTENT_TYPE, content_type)
                .body(serde_json::to_vec(&value)?),
            Some(RequestBody::Bytes { content_type, data }) => {
                builder.header(CONTENT_TYPE, content_type).body(data)
            }
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        tracing::trace!(status = status, bytes = body.len(), "response received");
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        let ctx = AppContext::new("app1", "key1", "https://api.stratus.example").unwrap();
        RestClient::new(ctx).unwrap()
    }

    #[test]
    fn test_request_url_joins_cleanly() {
        let client = client();
        assert_eq!(
            client.request_url("/apps/app1/users/u1"),
            "https://api.stratus.example/apps/app1/users/u1"
        );
    }

    #[test]
    fn test_request_url_with_path_prefix_endpoint() {
        let ctx = AppContext::new("app1", "key1", "https://gateway.example/stratus/").unwrap();
        let client = RestClient::new(ctx).unwrap();
        assert_eq!(
            client.request_url("/apps/app1/groups"),
            "https://gateway.example/stratus/apps/app1/groups"
        );
    }

    #[test]
    fn test_token_lifecycle() {
        let client = client();
        assert!(client.token().is_none());
        client.set_token("t-1");
        assert_eq!(client.token().as_deref(), Some("t-1"));
        client.clear_token();
        assert!(client.token().is_none());
    }
}
