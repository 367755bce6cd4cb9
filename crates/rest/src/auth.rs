//! Authentication and user registration
//!
//! Thin wrappers over the token and user endpoints. Session state is just
//! the bearer token held by the client; there is no refresh machinery.

use serde_json::{Value, json};

use sc_core::validate::{check_email, check_password, check_phone};
use sc_core::{ApiRequest, Error, Result, Transport, UserHandle};

use crate::client::RestClient;

/// An established session
#[derive(Debug, Clone)]
pub struct Session {
    /// Id of the authenticated user, when the server reports one
    pub user_id: Option<String>,
    /// Bearer token
    pub access_token: String,
}

impl RestClient {
    /// Exchange username/password for a session token
    ///
    /// On success the token is installed on the client for subsequent
    /// requests.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let body = json!({
            "username": username,
            "password": password,
            "grantType": "password",
        });
        let path = self.context().api_path("/oauth2/token");
        let response = self.send(ApiRequest::post(path, body)).await?;
        if matches!(response.status, 400 | 401) {
            return Err(match response.into_error() {
                Error::Remote { message, .. } => Error::Auth(message),
                other => other,
            });
        }
        let response = response.check()?;

        let body = response.json()?;
        let token = body
            .get("accessToken")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::UnexpectedResponse("token response missing accessToken".to_string())
            })?
            .to_string();
        let user_id = body.get("id").and_then(Value::as_str).map(str::to_string);

        self.set_token(&token);
        tracing::debug!(user_id = ?user_id, "session established");
        Ok(Session {
            user_id,
            access_token: token,
        })
    }

    /// Register a new user
    ///
    /// Email, phone, and password formats are validated before anything is
    /// sent.
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<UserHandle> {
        check_password(password)?;
        if let Some(email) = email {
            check_email(email)?;
        }
        if let Some(phone) = phone {
            check_phone(phone)?;
        }

        let mut body = json!({
            "loginName": username,
            "password": password,
        });
        if let Some(email) = email {
            body["emailAddress"] = json!(email);
        }
        if let Some(phone) = phone {
            body["phoneNumber"] = json!(phone);
        }

        let path = self.context().api_path("/users");
        let response = self.send(ApiRequest::post(path, body)).await?.check()?;

        let created = response.json()?;
        let id = created
            .get("userID")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::UnexpectedResponse("user create response missing userID".to_string())
            })?;
        Ok(UserHandle::with_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_core::AppContext;

    #[tokio::test]
    async fn test_register_user_validates_before_sending() {
        let ctx = AppContext::new("app1", "key1", "https://api.stratus.example").unwrap();
        let client = RestClient::new(ctx).unwrap();

        // Local validation failure: no request is attempted, so no network
        // error can surface.
        let err = client
            .register_user("alice", "pw", Some("not-an-email"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = client
            .register_user("alice", "x", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
