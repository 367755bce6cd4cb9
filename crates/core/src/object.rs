//! Object handles and the persistence engine
//!
//! An object carries two field maps: `committed` (server-acknowledged
//! state) and `pending` (locally staged mutations). Mutating a field only
//! ever writes into `pending`; the committed map changes exclusively when a
//! server response is folded back in. Every failure path leaves local state
//! exactly as it was before the call.

use jiff::Timestamp;
use serde_json::Value;

use crate::context::AppContext;
use crate::document::{Document, RESERVED_PREFIX};
use crate::error::{Error, Result};
use crate::scope::Bucket;
use crate::transfer::TransferTarget;
use crate::transport::{ApiRequest, ApiResponse, Transport, write_precondition};
use crate::uri::{Segment, SegmentKind, Uri};

/// A handle to an object in a bucket
///
/// Lifecycle: Unsaved (no id) → Created → Synced → Deleted (terminal).
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHandle {
    bucket: Bucket,
    id: Option<String>,
    version: Option<String>,
    created_at: Option<Timestamp>,
    modified_at: Option<Timestamp>,
    committed: Document,
    pending: Document,
    deleted: bool,
}

impl ObjectHandle {
    /// A new, unsaved object in the given bucket
    pub fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            id: None,
            version: None,
            created_at: None,
            modified_at: None,
            committed: Document::new(),
            pending: Document::new(),
            deleted: false,
        }
    }

    /// A handle to an existing object id
    ///
    /// The handle is unpopulated until `refresh` or a save.
    pub fn with_id(bucket: Bucket, id: impl Into<String>) -> Self {
        let mut handle = Self::new(bucket);
        handle.id = Some(id.into());
        handle
    }

    /// Object id, absent until the first successful create
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The owning bucket
    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    /// Cached version token, absent until fetched or issued by a save
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Server creation time, absent until created
    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    /// Server modification time
    pub fn modified_at(&self) -> Option<Timestamp> {
        self.modified_at
    }

    /// Whether the object has been deleted (terminal)
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Server-acknowledged fields
    pub fn committed(&self) -> &Document {
        &self.committed
    }

    /// Locally staged, unsynced fields
    pub fn pending(&self) -> &Document {
        &self.pending
    }

    /// Stage a field value
    ///
    /// Never touches `committed`; reserved-prefix keys are rejected.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.ensure_live()?;
        self.pending.insert(key, value)
    }

    /// Read a field: staged value first, committed fallback
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pending.get(key).or_else(|| self.committed.get(key))
    }

    /// Remove a field from both maps
    ///
    /// A locally removed field that was never sent must not resurrect on
    /// the next patch.
    pub fn remove(&mut self, key: &str) {
        self.pending.remove(key);
        self.committed.remove(key);
    }

    /// Re-derive the address of this object
    ///
    /// Owner and bucket ids must be assigned; a missing object id
    /// round-trips as the empty trailing value.
    pub fn uri(&self) -> Result<Uri> {
        let mut segments = Vec::with_capacity(3);
        if let Some(owner) = self.bucket.owner() {
            let id = owner.id().ok_or_else(|| {
                Error::IllegalState(format!("bucket owner ({}) id not assigned", owner.kind()))
            })?;
            let kind = match owner.kind() {
                "users" => SegmentKind::Users,
                "groups" => SegmentKind::Groups,
                _ => SegmentKind::Things,
            };
            segments.push(Segment::new(kind, id));
        }
        segments.push(Segment::new(
            SegmentKind::Buckets,
            self.bucket.qualified_name(),
        ));
        segments.push(Segment::new(
            SegmentKind::Objects,
            self.id.as_deref().unwrap_or(""),
        ));
        Ok(Uri::from_segments(segments))
    }

    /// Derive the body-transfer descriptor for this object
    pub fn transfer_target(&self) -> Result<TransferTarget> {
        TransferTarget::from_uri(&self.uri()?)
    }

    /// API path of the bucket's object collection
    pub fn collection_path(&self, ctx: &AppContext) -> Result<String> {
        Ok(format!("{}/objects", self.bucket.request_path(ctx)?))
    }

    /// API path of this object; requires an assigned id
    pub fn request_path(&self, ctx: &AppContext) -> Result<String> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| Error::IllegalState("object id not assigned".to_string()))?;
        Ok(format!("{}/{id}", self.collection_path(ctx)?))
    }

    /// Create the object on the server
    ///
    /// Sends the merged committed ⊎ pending document. On success the
    /// server-issued id, timestamps, and version token (when the response
    /// carries one) are captured, the sent fields become committed, and
    /// pending is cleared.
    pub async fn create(&mut self, ctx: &AppContext, transport: &dyn Transport) -> Result<()> {
        self.ensure_live()?;
        if self.id.is_some() {
            return Err(Error::IllegalState(
                "object already has an id; use save".to_string(),
            ));
        }

        let document = self.committed.merged(&self.pending);
        let request = ApiRequest::post(self.collection_path(ctx)?, document.to_value());
        let response = transport.send(request).await?.check()?;

        let body = response.json()?;
        let id = body
            .get("objectID")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::UnexpectedResponse("create response missing objectID".to_string())
            })?
            .to_string();
        let created_at = parse_millis(body.get("createdAt").ok_or_else(|| {
            Error::UnexpectedResponse("create response missing createdAt".to_string())
        })?)?;
        let version = response.version_token();

        tracing::debug!(object_id = %id, "object created");
        self.id = Some(id);
        self.created_at = Some(created_at);
        self.modified_at = Some(created_at);
        self.version = version;
        self.committed = document;
        self.pending.clear();
        Ok(())
    }

    /// Full-overwrite save of the merged committed ⊎ pending document
    ///
    /// Creates the object when it has no id. With `overwrite` the update is
    /// unconditional; without it the write carries a version-match
    /// precondition (or must-not-exist when never created), failing locally
    /// when no version token is cached.
    pub async fn save_all_fields(
        &mut self,
        ctx: &AppContext,
        transport: &dyn Transport,
        overwrite: bool,
    ) -> Result<()> {
        self.ensure_live()?;
        if self.id.is_none() {
            return self.create(ctx, transport).await;
        }
        let precondition =
            write_precondition(overwrite, self.created_at.is_some(), self.version.as_deref())?;

        let document = self.committed.merged(&self.pending);
        let request =
            ApiRequest::put(self.request_path(ctx)?, document.to_value()).precondition(precondition);
        let response = transport.send(request).await?.check()?;

        let (created_at, modified_at) = parse_update_times(&response);
        let version = response.version_token();

        if let Some(ts) = created_at {
            self.created_at = Some(ts);
        }
        if let Some(ts) = modified_at {
            self.modified_at = Some(ts);
        }
        self.version = version;
        self.committed = document;
        self.pending.clear();
        Ok(())
    }

    /// Partial save: send only the pending fields as a patch
    ///
    /// Same precondition rules as [`Self::save_all_fields`]. The server
    /// responds with the canonical full document, which replaces the
    /// committed map wholesale; pending is cleared. With no id this is
    /// identical to create. With nothing pending, no request is issued.
    pub async fn save(
        &mut self,
        ctx: &AppContext,
        transport: &dyn Transport,
        overwrite: bool,
    ) -> Result<()> {
        self.ensure_live()?;
        if self.id.is_none() {
            return self.create(ctx, transport).await;
        }
        let precondition =
            write_precondition(overwrite, self.created_at.is_some(), self.version.as_deref())?;
        if self.pending.is_empty() {
            tracing::debug!("no pending fields, skipping patch");
            return Ok(());
        }

        let request = ApiRequest::patch(self.request_path(ctx)?, self.pending.to_value())
            .precondition(precondition);
        let response = transport.send(request).await?.check()?;

        let (meta, fields) = split_server_document(response.json()?)?;
        let version = response.version_token().or(meta.version);

        if let Some(id) = meta.id {
            self.id = Some(id);
        }
        if let Some(ts) = meta.created {
            self.created_at = Some(ts);
        }
        if let Some(ts) = meta.modified {
            self.modified_at = Some(ts);
        }
        self.version = version;
        self.committed = fields;
        self.pending.clear();
        Ok(())
    }

    /// Unconditional read
    ///
    /// Replaces the committed map wholesale and the cached version token
    /// with the returned one. Staged pending fields survive a refresh.
    pub async fn refresh(&mut self, ctx: &AppContext, transport: &dyn Transport) -> Result<()> {
        self.ensure_live()?;
        let request = ApiRequest::get(self.request_path(ctx)?);
        let response = transport.send(request).await?.check()?;

        let (meta, fields) = split_server_document(response.json()?)?;
        let version = response.version_token().or(meta.version);

        if let Some(id) = meta.id {
            self.id = Some(id);
        }
        if let Some(ts) = meta.created {
            self.created_at = Some(ts);
        }
        if let Some(ts) = meta.modified {
            self.modified_at = Some(ts);
        }
        self.version = version;
        self.committed = fields;
        Ok(())
    }

    /// Delete the object; the handle becomes terminally unusable
    pub async fn delete(&mut self, ctx: &AppContext, transport: &dyn Transport) -> Result<()> {
        self.ensure_live()?;
        let request = ApiRequest::delete(self.request_path(ctx)?);
        transport.send(request).await?.check()?;

        self.deleted = true;
        self.version = None;
        self.committed.clear();
        self.pending.clear();
        Ok(())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.deleted {
            Err(Error::IllegalState("object has been deleted".to_string()))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
struct ServerMeta {
    id: Option<String>,
    created: Option<Timestamp>,
    modified: Option<Timestamp>,
    version: Option<String>,
}

/// Split a server object document into metadata and plain fields
///
/// Reserved-prefix keys are server metadata: the known ones feed the handle
/// (`_id`, `_created`, `_modified`, `_version`), the rest are dropped.
fn split_server_document(body: Value) -> Result<(ServerMeta, Document)> {
    let Value::Object(map) = body else {
        return Err(Error::UnexpectedResponse(
            "object document is not a JSON object".to_string(),
        ));
    };

    let mut meta = ServerMeta::default();
    let mut fields = serde_json::Map::new();
    for (key, value) in map {
        match key.as_str() {
            "_id" => meta.id = value.as_str().map(str::to_string),
            "_created" => meta.created = Some(parse_millis(&value)?),
            "_modified" => meta.modified = Some(parse_millis(&value)?),
            "_version" => {
                meta.version = match value {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }
            }
            k if k.starts_with(RESERVED_PREFIX) => {}
            _ => {
                fields.insert(key, value);
            }
        }
    }
    Ok((meta, Document::from_map(fields)))
}

fn parse_update_times(response: &ApiResponse) -> (Option<Timestamp>, Option<Timestamp>) {
    let Ok(body) = response.json() else {
        return (None, None);
    };
    let read = |key: &str| body.get(key).and_then(|v| parse_millis(v).ok());
    (read("createdAt"), read("modifiedAt"))
}

fn parse_millis(value: &Value) -> Result<Timestamp> {
    let ms = value.as_i64().ok_or_else(|| {
        Error::UnexpectedResponse(format!("expected epoch milliseconds, got {value}"))
    })?;
    Timestamp::from_millisecond(ms)
        .map_err(|e| Error::UnexpectedResponse(format!("timestamp out of range: {e}")))
}
