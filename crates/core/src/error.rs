//! Error types for the stratus client SDK
//!
//! The taxonomy separates failures that never reach the network (grammar,
//! structural, illegal-state, config) from remote failures surfaced by the
//! transport. Remote errors carry the HTTP status, the server-defined error
//! code when present, and the server message, and are propagated untouched.

use thiserror::Error;

/// Result type alias for stratus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stratus SDK operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed address: bad scheme, misplaced or duplicate owner segment,
    /// empty address
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// Address contains a segment kind outside the supported set
    #[error("unsupported entity type: {0}")]
    UnsupportedEntity(String),

    /// Address resolved, but does not terminate in an object
    #[error("uri does not address an object: {0}")]
    NotAnObject(String),

    /// A segment required to build a descriptor is absent from the address
    #[error("no {kind} segment in uri: {uri}")]
    MissingSegment { kind: &'static str, uri: String },

    /// The address's outermost owner cannot be a transfer-target scope
    #[error("unsupported transfer target: {0}")]
    UnsupportedTransferTarget(String),

    /// Operation requires local state the handle does not hold
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Field key rejected at the mutation boundary
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// Field value failed format validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Configuration error (endpoint, profile store)
    #[error("config error: {0}")]
    Config(String),

    /// Named profile does not exist in the profile store
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    /// Transport-level failure before a response was received
    #[error("network error: {0}")]
    Network(String),

    /// Authentication or token acquisition failure
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Non-success response from the server
    #[error("server returned {status}: {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Server-defined error code, when the error body carried one
        code: Option<String>,
        /// Human-readable message
        message: String,
    },

    /// Success response whose body did not match the documented shape
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status of a remote error, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for precondition-failure responses (version conflict)
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Remote { status: 409 | 412, .. })
    }

    /// True for not-found responses
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Remote { status: 404, .. })
    }

    /// True when the failure never left the client
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            Error::Remote { .. } | Error::Network(_) | Error::Auth(_) | Error::UnexpectedResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let e = Error::Remote {
            status: 409,
            code: Some("OBJECT_VERSION_IS_STALE".to_string()),
            message: "object version is stale".to_string(),
        };
        assert_eq!(e.to_string(), "server returned 409: object version is stale");
        assert_eq!(e.status(), Some(409));
        assert!(e.is_conflict());
        assert!(!e.is_not_found());
    }

    #[test]
    fn test_precondition_failed_is_conflict() {
        let e = Error::Remote {
            status: 412,
            code: None,
            message: "precondition failed".to_string(),
        };
        assert!(e.is_conflict());
    }

    #[test]
    fn test_local_classification() {
        assert!(Error::InvalidUri("x".to_string()).is_local());
        assert!(Error::IllegalState("x".to_string()).is_local());
        assert!(
            !Error::Remote {
                status: 500,
                code: None,
                message: "boom".to_string(),
            }
            .is_local()
        );
        assert!(!Error::Network("reset".to_string()).is_local());
    }
}
