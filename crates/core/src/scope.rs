//! Resource handles and ownership scopes
//!
//! The backend organizes data as application → {user | group | thing} →
//! bucket → object. Handles for users, groups, things, and buckets are pure
//! client-side references: constructing one performs no network call, and
//! its committed fields are only populated by an explicit `refresh`.

use serde::Serialize;
use serde_json::Value;

use crate::context::AppContext;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::group::GroupHandle;
use crate::transport::{ApiRequest, Transport};

/// Literal prefix marking an encrypted bucket in addresses and wire names
pub const CRYPTO_PREFIX: &str = "CRYPTO:";

/// Storage kind of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    /// Plain storage
    Plain,
    /// Encrypted storage
    Crypto,
}

/// A reference to a user
#[derive(Debug, Clone, PartialEq)]
pub struct UserHandle {
    id: Option<String>,
    fields: Document,
}

impl UserHandle {
    /// Handle for a user whose id is not yet assigned
    pub fn new() -> Self {
        Self {
            id: None,
            fields: Document::new(),
        }
    }

    /// Handle for an existing user id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Document::new(),
        }
    }

    /// User id, if assigned
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Committed fields from the last refresh
    pub fn fields(&self) -> &Document {
        &self.fields
    }

    /// A bucket owned by this user
    pub fn bucket(&self, name: &str) -> Bucket {
        Bucket::scoped(Some(Owner::User(self.clone())), name)
    }

    /// Fetch the user document, replacing committed fields wholesale
    pub async fn refresh(&mut self, ctx: &AppContext, transport: &dyn Transport) -> Result<()> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| Error::IllegalState("user id not assigned".to_string()))?;
        let resp = transport
            .send(ApiRequest::get(ctx.api_path(&format!("/users/{id}"))))
            .await?
            .check()?;
        let Value::Object(map) = resp.json()? else {
            return Err(Error::UnexpectedResponse(
                "user document is not a JSON object".to_string(),
            ));
        };
        self.fields = Document::from_map(map);
        Ok(())
    }
}

impl Default for UserHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A reference to a device-like "thing"
#[derive(Debug, Clone, PartialEq)]
pub struct ThingHandle {
    id: Option<String>,
    fields: Document,
}

impl ThingHandle {
    /// Handle for a thing whose id is not yet assigned
    pub fn new() -> Self {
        Self {
            id: None,
            fields: Document::new(),
        }
    }

    /// Handle for an existing thing id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Document::new(),
        }
    }

    /// Thing id, if assigned
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Committed fields from the last refresh
    pub fn fields(&self) -> &Document {
        &self.fields
    }

    /// A bucket owned by this thing
    pub fn bucket(&self, name: &str) -> Bucket {
        Bucket::scoped(Some(Owner::Thing(self.clone())), name)
    }

    /// Fetch the thing document, replacing committed fields wholesale
    pub async fn refresh(&mut self, ctx: &AppContext, transport: &dyn Transport) -> Result<()> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| Error::IllegalState("thing id not assigned".to_string()))?;
        let resp = transport
            .send(ApiRequest::get(ctx.api_path(&format!("/things/{id}"))))
            .await?
            .check()?;
        let Value::Object(map) = resp.json()? else {
            return Err(Error::UnexpectedResponse(
                "thing document is not a JSON object".to_string(),
            ));
        };
        self.fields = Document::from_map(map);
        Ok(())
    }
}

impl Default for ThingHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The owner of a bucket: a user, group, or thing
///
/// `None` at the use sites means application scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Owner {
    /// User-scoped
    User(UserHandle),
    /// Group-scoped
    Group(GroupHandle),
    /// Thing-scoped
    Thing(ThingHandle),
}

impl Owner {
    /// The owner's id, if assigned
    pub fn id(&self) -> Option<&str> {
        match self {
            Owner::User(u) => u.id(),
            Owner::Group(g) => g.id(),
            Owner::Thing(t) => t.id(),
        }
    }

    /// The address segment kind naming this owner
    pub fn kind(&self) -> &'static str {
        match self {
            Owner::User(_) => "users",
            Owner::Group(_) => "groups",
            Owner::Thing(_) => "things",
        }
    }
}

/// An addressing scope for objects
///
/// A bucket is never independently persisted; it names where objects live.
/// The owner is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    name: String,
    kind: BucketKind,
    owner: Option<Owner>,
}

impl Bucket {
    /// An application-scoped bucket
    pub fn app_scoped(name: &str) -> Self {
        Self::scoped(None, name)
    }

    /// A bucket with an explicit owner (`None` = application scope)
    ///
    /// The raw name may carry the `CRYPTO:` prefix; it is stripped into the
    /// storage kind.
    pub fn scoped(owner: Option<Owner>, raw_name: &str) -> Self {
        let (kind, name) = Self::parse_name(raw_name);
        Self {
            name: name.to_string(),
            kind,
            owner,
        }
    }

    /// Split a raw bucket name into storage kind and logical name
    ///
    /// Literal case-sensitive prefix match only.
    pub fn parse_name(raw: &str) -> (BucketKind, &str) {
        match raw.strip_prefix(CRYPTO_PREFIX) {
            Some(rest) => (BucketKind::Crypto, rest),
            None => (BucketKind::Plain, raw),
        }
    }

    /// Logical bucket name, prefix stripped
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage kind
    pub fn kind(&self) -> BucketKind {
        self.kind
    }

    /// Owner scope (`None` = application scope)
    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    /// Wire name with the `CRYPTO:` prefix re-applied for crypto buckets
    pub fn qualified_name(&self) -> String {
        match self.kind {
            BucketKind::Plain => self.name.clone(),
            BucketKind::Crypto => format!("{CRYPTO_PREFIX}{}", self.name),
        }
    }

    /// API path of the owning scope: `/apps/{app}[/users/{id}|...]`
    pub fn scope_path(&self, ctx: &AppContext) -> Result<String> {
        match &self.owner {
            None => Ok(ctx.api_path("")),
            Some(owner) => {
                let id = owner.id().ok_or_else(|| {
                    Error::IllegalState(format!("bucket owner ({}) id not assigned", owner.kind()))
                })?;
                Ok(ctx.api_path(&format!("/{}/{id}", owner.kind())))
            }
        }
    }

    /// API path of this bucket
    pub fn request_path(&self, ctx: &AppContext) -> Result<String> {
        Ok(format!(
            "{}/buckets/{}",
            self.scope_path(ctx)?,
            self.qualified_name()
        ))
    }
}

/// A resolved resource: the result of folding an address
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// A user reference
    User(UserHandle),
    /// A group reference
    Group(GroupHandle),
    /// A thing reference
    Thing(ThingHandle),
    /// A bucket scope
    Bucket(Bucket),
    /// An object handle
    Object(crate::object::ObjectHandle),
}

impl Resource {
    /// The segment kind naming this resource
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::User(_) => "users",
            Resource::Group(_) => "groups",
            Resource::Thing(_) => "things",
            Resource::Bucket(_) => "buckets",
            Resource::Object(_) => "objects",
        }
    }

    /// Unwrap an object handle, or fail structurally
    pub fn into_object(self) -> Result<crate::object::ObjectHandle> {
        match self {
            Resource::Object(o) => Ok(o),
            other => Err(Error::NotAnObject(format!(
                "resolved to a {} resource",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_plain() {
        let (kind, name) = Bucket::parse_name("mybucket");
        assert_eq!(kind, BucketKind::Plain);
        assert_eq!(name, "mybucket");
    }

    #[test]
    fn test_parse_name_crypto() {
        let (kind, name) = Bucket::parse_name("CRYPTO:mybucket");
        assert_eq!(kind, BucketKind::Crypto);
        assert_eq!(name, "mybucket");
    }

    #[test]
    fn test_parse_name_prefix_is_literal() {
        // Lowercase and mid-string occurrences are not the prefix
        let (kind, name) = Bucket::parse_name("crypto:mybucket");
        assert_eq!(kind, BucketKind::Plain);
        assert_eq!(name, "crypto:mybucket");

        let (kind, name) = Bucket::parse_name("myCRYPTO:bucket");
        assert_eq!(kind, BucketKind::Plain);
        assert_eq!(name, "myCRYPTO:bucket");
    }

    #[test]
    fn test_qualified_name_round_trip() {
        let b = Bucket::app_scoped("CRYPTO:vault");
        assert_eq!(b.name(), "vault");
        assert_eq!(b.kind(), BucketKind::Crypto);
        assert_eq!(b.qualified_name(), "CRYPTO:vault");

        let b = Bucket::app_scoped("plainbox");
        assert_eq!(b.qualified_name(), "plainbox");
    }

    #[test]
    fn test_scope_paths() {
        let ctx = AppContext::new("app1", "key", "https://api.stratus.example").unwrap();

        let app = Bucket::app_scoped("b");
        assert_eq!(app.request_path(&ctx).unwrap(), "/apps/app1/buckets/b");

        let user = UserHandle::with_id("u1").bucket("b");
        assert_eq!(
            user.request_path(&ctx).unwrap(),
            "/apps/app1/users/u1/buckets/b"
        );

        let thing = ThingHandle::with_id("t1").bucket("CRYPTO:b");
        assert_eq!(
            thing.request_path(&ctx).unwrap(),
            "/apps/app1/things/t1/buckets/CRYPTO:b"
        );
    }

    #[test]
    fn test_scope_path_requires_owner_id() {
        let ctx = AppContext::new("app1", "key", "https://api.stratus.example").unwrap();
        let bucket = Bucket::scoped(Some(Owner::User(UserHandle::new())), "b");
        assert!(matches!(
            bucket.request_path(&ctx),
            Err(Error::IllegalState(_))
        ));
    }

    #[tokio::test]
    async fn test_user_refresh_replaces_fields() {
        use crate::transport::ApiResponse;
        use async_trait::async_trait;
        use bytes::Bytes;
        use http::HeaderMap;

        struct OneShot(serde_json::Value);

        #[async_trait]
        impl Transport for OneShot {
            async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
                assert_eq!(request.path, "/apps/app1/users/u1");
                Ok(ApiResponse {
                    status: 200,
                    headers: HeaderMap::new(),
                    body: Bytes::from(serde_json::to_vec(&self.0).unwrap()),
                })
            }
        }

        let ctx = AppContext::new("app1", "key", "https://api.stratus.example").unwrap();
        let transport = OneShot(serde_json::json!({"userID": "u1", "loginName": "alice"}));

        let mut user = UserHandle::with_id("u1");
        user.refresh(&ctx, &transport).await.unwrap();
        assert_eq!(
            user.fields().get("loginName"),
            Some(&serde_json::json!("alice"))
        );

        // Refresh without an assigned id fails before any network call
        let mut blank = UserHandle::new();
        assert!(matches!(
            blank.refresh(&ctx, &transport).await,
            Err(Error::IllegalState(_))
        ));
    }

    #[test]
    fn test_owner_is_fixed_at_construction() {
        // No setter exists; this is a compile-time property. Assert the
        // accessor reflects the constructor input.
        let bucket = UserHandle::with_id("u1").bucket("b");
        match bucket.owner() {
            Some(Owner::User(u)) => assert_eq!(u.id(), Some("u1")),
            other => panic!("unexpected owner: {other:?}"),
        }
    }
}
