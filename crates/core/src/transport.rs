//! Transport contract
//!
//! The core never talks HTTP itself: it produces [`ApiRequest`]s and folds
//! [`ApiResponse`]s. Anything implementing [`Transport`] (the REST adapter,
//! a test stub) carries them. Version tokens ride the `ETag` response
//! header; write preconditions ride `If-Match` / `If-None-Match`.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method};
use serde_json::Value;

use crate::error::{Error, Result};

/// Response header carrying the version token
pub const VERSION_HEADER: &str = "etag";

/// JSON media type used for document bodies
pub const MEDIA_JSON: &str = "application/json";

/// A request produced by the core for the transport to send
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path under the endpoint, starting with `/`
    pub path: String,
    /// Additional headers (name, value)
    pub headers: Vec<(String, String)>,
    /// Optional body
    pub body: Option<RequestBody>,
}

/// Request body: a JSON document or raw bytes
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// JSON value with a media type
    Json {
        /// Media type sent as Content-Type
        content_type: String,
        /// The document
        value: Value,
    },
    /// Raw bytes with a media type
    Bytes {
        /// Media type sent as Content-Type
        content_type: String,
        /// The payload
        data: Bytes,
    },
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// POST request with a JSON body
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).json(body)
    }

    /// PUT request with a JSON body
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).json(body)
    }

    /// PATCH request with a JSON body
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).json(body)
    }

    /// PUT request with a raw byte body
    pub fn put_bytes(path: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self::new(Method::PUT, path).bytes(content_type, data)
    }

    /// PUT request with no body
    pub fn put_empty(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Attach a JSON body
    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(RequestBody::Json {
            content_type: MEDIA_JSON.to_string(),
            value,
        });
        self
    }

    /// Attach a raw byte body
    pub fn bytes(mut self, content_type: impl Into<String>, data: Bytes) -> Self {
        self.body = Some(RequestBody::Bytes {
            content_type: content_type.into(),
            data,
        });
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a write precondition, if one applies
    pub fn precondition(self, precondition: Option<Precondition>) -> Self {
        match precondition {
            None => self,
            Some(Precondition::MatchVersion(token)) => self.header("If-Match", token),
            Some(Precondition::NotExists) => self.header("If-None-Match", "*"),
        }
    }
}

/// A response surfaced by the transport
///
/// The transport returns every HTTP response, success or not; callers
/// decide with [`ApiResponse::check`]. Only failures to obtain a response
/// at all are transport errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers (case-insensitive lookup)
    pub headers: HeaderMap,
    /// Raw body
    pub body: Bytes,
}

impl ApiResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The version token from the response, if present
    pub fn version_token(&self) -> Option<String> {
        self.header(VERSION_HEADER).map(str::to_string)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).map_err(Error::from)
    }

    /// Pass the response through on success, or convert it to a remote error
    pub fn check(self) -> Result<ApiResponse> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Convert a non-success response into [`Error::Remote`]
    ///
    /// The server's error body is `{"errorCode": ..., "message": ...}` when
    /// structured; anything else falls back to the raw body text.
    pub fn into_error(self) -> Error {
        let (code, message) = match serde_json::from_slice::<Value>(&self.body) {
            Ok(v) => (
                v.get("errorCode")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                v.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| v.to_string()),
            ),
            Err(_) => (None, String::from_utf8_lossy(&self.body).into_owned()),
        };
        Error::Remote {
            status: self.status,
            code,
            message,
        }
    }
}

/// A write precondition for conditional persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Write only if the server's version matches the cached token
    MatchVersion(String),
    /// Write only if the resource does not already exist
    NotExists,
}

/// Select the precondition for a save operation
///
/// `created` is whether the resource has previously been created/fetched.
/// With `overwrite` the write is unconditional. Without it, a created
/// resource needs its cached version token (fail fast if none is cached,
/// before any network call), and a never-created resource must not already
/// exist on the server.
pub fn write_precondition(
    overwrite: bool,
    created: bool,
    version: Option<&str>,
) -> Result<Option<Precondition>> {
    if overwrite {
        return Ok(None);
    }
    if created {
        match version {
            Some(token) => Ok(Some(Precondition::MatchVersion(token.to_string()))),
            None => Err(Error::IllegalState(
                "no cached version token; refresh before saving with overwrite disabled"
                    .to_string(),
            )),
        }
    } else {
        Ok(Some(Precondition::NotExists))
    }
}

/// The transport seam between the core and the wire
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and surface the response
    ///
    /// Implementations return `Err` only when no response was obtained
    /// (connection failure, timeout); HTTP error statuses come back as
    /// ordinary responses.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;
    use serde_json::json;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("ETag", HeaderValue::from_static("v-abc"));
        let resp = ApiResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        };
        assert_eq!(resp.header("etag"), Some("v-abc"));
        assert_eq!(resp.header("ETAG"), Some("v-abc"));
        assert_eq!(resp.version_token(), Some("v-abc".to_string()));
    }

    #[test]
    fn test_check_success_passthrough() {
        assert!(response(204, "").check().is_ok());
    }

    #[test]
    fn test_check_structured_error_body() {
        let err = response(409, r#"{"errorCode":"VERSION_STALE","message":"stale"}"#)
            .check()
            .unwrap_err();
        match err {
            Error::Remote {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("VERSION_STALE"));
                assert_eq!(message, "stale");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_unstructured_error_body() {
        let err = response(500, "internal error").check().unwrap_err();
        match err {
            Error::Remote { status, code, message } => {
                assert_eq!(status, 500);
                assert!(code.is_none());
                assert_eq!(message, "internal error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_precondition_headers() {
        let req = ApiRequest::put("/x", json!({}))
            .precondition(Some(Precondition::MatchVersion("v1".to_string())));
        assert!(
            req.headers
                .iter()
                .any(|(n, v)| n == "If-Match" && v == "v1")
        );

        let req = ApiRequest::put("/x", json!({})).precondition(Some(Precondition::NotExists));
        assert!(
            req.headers
                .iter()
                .any(|(n, v)| n == "If-None-Match" && v == "*")
        );

        let req = ApiRequest::put("/x", json!({})).precondition(None);
        assert!(req.headers.is_empty());
    }

    #[test]
    fn test_write_precondition_overwrite_is_unconditional() {
        assert_eq!(write_precondition(true, true, None).unwrap(), None);
        assert_eq!(write_precondition(true, false, Some("v")).unwrap(), None);
    }

    #[test]
    fn test_write_precondition_created_with_token() {
        assert_eq!(
            write_precondition(false, true, Some("v1")).unwrap(),
            Some(Precondition::MatchVersion("v1".to_string()))
        );
    }

    #[test]
    fn test_write_precondition_created_without_token_fails_fast() {
        let err = write_precondition(false, true, None).unwrap_err();
        assert!(matches!(err, Error::IllegalState(_)));
    }

    #[test]
    fn test_write_precondition_never_created() {
        assert_eq!(
            write_precondition(false, false, None).unwrap(),
            Some(Precondition::NotExists)
        );
    }
}
