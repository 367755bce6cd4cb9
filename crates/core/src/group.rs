//! Group handles and membership persistence
//!
//! Group membership follows the same optimistic-concurrency discipline as
//! object documents: local edits stage into pending add/remove sets, the
//! committed member list changes only when a server response is folded
//! back, and conditional writes reuse the shared precondition selection.

use std::collections::BTreeSet;

use serde_json::{Value, json};

use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, Transport, write_precondition};

/// A handle to a group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHandle {
    id: Option<String>,
    name: Option<String>,
    members: BTreeSet<String>,
    pending_add: BTreeSet<String>,
    pending_remove: BTreeSet<String>,
    version: Option<String>,
    synced: bool,
}

impl GroupHandle {
    /// A new, uncreated group with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: None,
            name: if name.is_empty() { None } else { Some(name) },
            members: BTreeSet::new(),
            pending_add: BTreeSet::new(),
            pending_remove: BTreeSet::new(),
            version: None,
            synced: false,
        }
    }

    /// A handle to an existing group id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
            members: BTreeSet::new(),
            pending_add: BTreeSet::new(),
            pending_remove: BTreeSet::new(),
            version: None,
            synced: false,
        }
    }

    /// Group id, absent until created
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Group name, if known
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Cached version token
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Server-acknowledged member list
    pub fn committed_members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// The member list as it would be after a save
    pub fn members(&self) -> BTreeSet<String> {
        let mut view = self.members.clone();
        for m in &self.pending_add {
            view.insert(m.clone());
        }
        for m in &self.pending_remove {
            view.remove(m);
        }
        view
    }

    /// Whether local membership edits are staged
    pub fn has_pending_changes(&self) -> bool {
        !self.pending_add.is_empty() || !self.pending_remove.is_empty()
    }

    /// Stage adding a member
    pub fn add_member(&mut self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        if self.pending_remove.remove(&user_id) {
            return;
        }
        if !self.members.contains(&user_id) {
            self.pending_add.insert(user_id);
        }
    }

    /// Stage removing a member
    pub fn remove_member(&mut self, user_id: &str) {
        if self.pending_add.remove(user_id) {
            return;
        }
        if self.members.contains(user_id) {
            self.pending_remove.insert(user_id.to_string());
        }
    }

    /// Save the membership (creating the group when it has no id)
    ///
    /// Sends the full effective member list. Precondition rules match the
    /// object engine: unconditional with `overwrite`, version-match (fail
    /// fast without a cached token) or must-not-exist otherwise.
    pub async fn save_members(
        &mut self,
        ctx: &AppContext,
        transport: &dyn Transport,
        overwrite: bool,
    ) -> Result<()> {
        let Some(id) = self.id.clone() else {
            return self.create(ctx, transport).await;
        };
        let precondition = write_precondition(overwrite, self.synced, self.version.as_deref())?;

        let members = self.members();
        let body = json!({"members": members.iter().collect::<Vec<_>>()});
        let request = ApiRequest::put(ctx.api_path(&format!("/groups/{id}/members")), body)
            .precondition(precondition);
        let response = transport.send(request).await?.check()?;

        self.version = response.version_token();
        self.members = members;
        self.pending_add.clear();
        self.pending_remove.clear();
        Ok(())
    }

    /// Fetch the group, replacing name and member list wholesale
    ///
    /// Staged membership edits survive a refresh.
    pub async fn refresh(&mut self, ctx: &AppContext, transport: &dyn Transport) -> Result<()> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| Error::IllegalState("group id not assigned".to_string()))?;
        let response = transport
            .send(ApiRequest::get(ctx.api_path(&format!("/groups/{id}"))))
            .await?
            .check()?;

        let body = response.json()?;
        let name = body.get("name").and_then(Value::as_str).map(str::to_string);
        let members = parse_members(&body)?;
        let version = response.version_token();

        if name.is_some() {
            self.name = name;
        }
        self.members = members;
        self.version = version;
        self.synced = true;
        Ok(())
    }

    async fn create(&mut self, ctx: &AppContext, transport: &dyn Transport) -> Result<()> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| Error::IllegalState("group name not assigned".to_string()))?;

        let members = self.members();
        let body = json!({"name": name, "members": members.iter().collect::<Vec<_>>()});
        let response = transport
            .send(ApiRequest::post(ctx.api_path("/groups"), body))
            .await?
            .check()?;

        let created = response.json()?;
        let id = created
            .get("groupID")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::UnexpectedResponse("group create response missing groupID".to_string())
            })?
            .to_string();
        let version = response.version_token();

        tracing::debug!(group_id = %id, "group created");
        self.id = Some(id);
        self.version = version;
        self.members = members;
        self.pending_add.clear();
        self.pending_remove.clear();
        self.synced = true;
        Ok(())
    }
}

fn parse_members(body: &Value) -> Result<BTreeSet<String>> {
    let Some(list) = body.get("members").and_then(Value::as_array) else {
        return Err(Error::UnexpectedResponse(
            "group document missing members list".to_string(),
        ));
    };
    Ok(list
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ApiResponse;
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{HeaderMap, header::HeaderValue};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct StubTransport {
        requests: Mutex<Vec<ApiRequest>>,
        responses: Mutex<VecDeque<ApiResponse>>,
    }

    impl StubTransport {
        fn new(responses: Vec<ApiResponse>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            }
        }

        fn request(&self, index: usize) -> ApiRequest {
            self.requests.lock().unwrap()[index].clone()
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::Network("stub transport exhausted".to_string()))
        }
    }

    fn ctx() -> AppContext {
        AppContext::new("app1", "key1", "https://api.stratus.example").unwrap()
    }

    fn json_response(status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from(serde_json::to_vec(&body).unwrap()),
        }
    }

    #[test]
    fn test_add_then_remove_is_neutral() {
        let mut group = GroupHandle::with_id("g1");
        group.add_member("u1");
        group.remove_member("u1");
        assert!(!group.has_pending_changes());
        assert!(group.members().is_empty());
    }

    #[test]
    fn test_remove_committed_then_add_is_neutral() {
        let mut group = GroupHandle::with_id("g1");
        group.members = BTreeSet::from(["u1".to_string()]);
        group.remove_member("u1");
        group.add_member("u1");
        assert!(!group.has_pending_changes());
        assert_eq!(group.members().len(), 1);
    }

    #[test]
    fn test_local_edits_never_touch_committed() {
        let mut group = GroupHandle::with_id("g1");
        group.add_member("u1");
        assert!(group.committed_members().is_empty());
        assert!(group.members().contains("u1"));
    }

    #[tokio::test]
    async fn test_create_on_save_without_id() {
        let transport = StubTransport::new(vec![json_response(201, json!({"groupID": "g-9"}))]);
        let mut group = GroupHandle::new("devs");
        group.add_member("u1");
        group.add_member("u2");

        group.save_members(&ctx(), &transport, true).await.unwrap();

        assert_eq!(group.id(), Some("g-9"));
        assert_eq!(group.committed_members().len(), 2);
        assert!(!group.has_pending_changes());

        let request = transport.request(0);
        assert_eq!(request.method, http::Method::POST);
        assert_eq!(request.path, "/apps/app1/groups");
    }

    #[tokio::test]
    async fn test_save_sends_full_effective_list() {
        let mut response = json_response(204, Value::Null);
        response.body = Bytes::new();
        response
            .headers
            .insert("ETag", HeaderValue::from_static("gv2"));
        let transport = StubTransport::new(vec![response]);

        let mut group = GroupHandle::with_id("g1");
        group.members = BTreeSet::from(["u1".to_string(), "u2".to_string()]);
        group.synced = true;
        group.add_member("u3");
        group.remove_member("u1");

        group.save_members(&ctx(), &transport, true).await.unwrap();

        let request = transport.request(0);
        assert_eq!(request.method, http::Method::PUT);
        assert_eq!(request.path, "/apps/app1/groups/g1/members");
        match request.body {
            Some(crate::transport::RequestBody::Json { ref value, .. }) => {
                assert_eq!(value, &json!({"members": ["u2", "u3"]}));
            }
            ref other => panic!("unexpected body: {other:?}"),
        }
        assert_eq!(group.version(), Some("gv2"));
        assert_eq!(
            group.committed_members(),
            &BTreeSet::from(["u2".to_string(), "u3".to_string()])
        );
    }

    #[tokio::test]
    async fn test_conditional_save_without_version_fails_fast() {
        let transport = StubTransport::new(vec![]);
        let mut group = GroupHandle::with_id("g1");
        group.synced = true;
        group.add_member("u1");

        let err = group
            .save_members(&ctx(), &transport, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IllegalState(_)));
        assert_eq!(transport.request_count(), 0);
        assert!(group.has_pending_changes());
    }

    #[tokio::test]
    async fn test_refresh_replaces_wholesale() {
        let transport = StubTransport::new(vec![json_response(
            200,
            json!({"groupID": "g1", "name": "devs", "members": ["a", "b"]}),
        )]);
        let mut group = GroupHandle::with_id("g1");
        group.members = BTreeSet::from(["stale".to_string()]);
        group.add_member("c");

        group.refresh(&ctx(), &transport).await.unwrap();

        assert_eq!(group.name(), Some("devs"));
        assert_eq!(
            group.committed_members(),
            &BTreeSet::from(["a".to_string(), "b".to_string()])
        );
        // Staged edits survive
        assert!(group.members().contains("c"));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state() {
        let transport = StubTransport::new(vec![json_response(
            409,
            json!({"errorCode": "GROUP_VERSION_IS_STALE", "message": "conflict"}),
        )]);
        let mut group = GroupHandle::with_id("g1");
        group.members = BTreeSet::from(["u1".to_string()]);
        group.synced = true;
        group.version = Some("gv1".to_string());
        group.add_member("u2");

        let err = group
            .save_members(&ctx(), &transport, false)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(group.committed_members().len(), 1);
        assert!(group.has_pending_changes());
        assert_eq!(group.version(), Some("gv1"));
    }
}
