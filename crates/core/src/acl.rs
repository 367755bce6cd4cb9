//! Access-control entries
//!
//! Typed model of the server's ACL document: a map from action verbs to
//! lists of subject references. Things are not an implemented ACL subject;
//! parsing one fails loudly instead of being coerced into a placeholder.

use serde_json::Value;

use crate::error::{Error, Result};

/// Grantable action verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclAction {
    /// Read an existing object
    ReadExistingObject,
    /// Write an existing object
    WriteExistingObject,
    /// Create objects in a bucket
    CreateObjectsInBucket,
    /// Query objects in a bucket
    QueryObjectsInBucket,
    /// Drop a bucket and all of its content
    DropBucket,
}

impl AclAction {
    /// Wire verb
    pub fn as_str(self) -> &'static str {
        match self {
            AclAction::ReadExistingObject => "READ_EXISTING_OBJECT",
            AclAction::WriteExistingObject => "WRITE_EXISTING_OBJECT",
            AclAction::CreateObjectsInBucket => "CREATE_OBJECTS_IN_BUCKET",
            AclAction::QueryObjectsInBucket => "QUERY_OBJECTS_IN_BUCKET",
            AclAction::DropBucket => "DROP_BUCKET",
        }
    }

    fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "READ_EXISTING_OBJECT" => Some(AclAction::ReadExistingObject),
            "WRITE_EXISTING_OBJECT" => Some(AclAction::WriteExistingObject),
            "CREATE_OBJECTS_IN_BUCKET" => Some(AclAction::CreateObjectsInBucket),
            "QUERY_OBJECTS_IN_BUCKET" => Some(AclAction::QueryObjectsInBucket),
            "DROP_BUCKET" => Some(AclAction::DropBucket),
            _ => None,
        }
    }
}

/// The grantee of an ACL entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclSubject {
    /// A specific user
    User(String),
    /// A specific group
    Group(String),
    /// Any user, authenticated or not
    Anonymous,
    /// Any authenticated user
    Authenticated,
}

impl AclSubject {
    /// Path fragment identifying this subject in ACL endpoints
    pub fn path_fragment(&self) -> String {
        match self {
            AclSubject::User(id) => format!("UserID:{id}"),
            AclSubject::Group(id) => format!("GroupID:{id}"),
            AclSubject::Anonymous => "UserID:ANONYMOUS_USER".to_string(),
            AclSubject::Authenticated => "UserID:ANY_AUTHENTICATED_USER".to_string(),
        }
    }
}

/// One granted (action, subject) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    /// Granted action
    pub action: AclAction,
    /// Grantee
    pub subject: AclSubject,
}

/// Parse a server ACL document into entries
///
/// Unknown action verbs are skipped (the server may grow new verbs);
/// unknown or thing-typed subjects are errors.
pub fn parse_entries(document: &Value) -> Result<Vec<AclEntry>> {
    let Value::Object(map) = document else {
        return Err(Error::UnexpectedResponse(
            "acl document is not a JSON object".to_string(),
        ));
    };

    let mut entries = Vec::new();
    for (verb, subjects) in map {
        let Some(action) = AclAction::from_verb(verb) else {
            tracing::debug!(verb = %verb, "skipping unknown acl action");
            continue;
        };
        let Some(list) = subjects.as_array() else {
            return Err(Error::UnexpectedResponse(format!(
                "acl subjects for {verb} are not a list"
            )));
        };
        for subject in list {
            entries.push(AclEntry {
                action,
                subject: parse_subject(subject)?,
            });
        }
    }
    Ok(entries)
}

fn parse_subject(value: &Value) -> Result<AclSubject> {
    if value.get("thingID").is_some() {
        // Not an implemented subject kind; refuse rather than coerce
        return Err(Error::UnsupportedEntity(
            "thing as acl subject".to_string(),
        ));
    }
    if let Some(id) = value.get("userID").and_then(Value::as_str) {
        return Ok(match id {
            "ANONYMOUS_USER" => AclSubject::Anonymous,
            "ANY_AUTHENTICATED_USER" => AclSubject::Authenticated,
            _ => AclSubject::User(id.to_string()),
        });
    }
    if let Some(id) = value.get("groupID").and_then(Value::as_str) {
        return Ok(AclSubject::Group(id.to_string()));
    }
    Err(Error::UnexpectedResponse(format!(
        "unrecognized acl subject: {value}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_user_and_group_subjects() {
        let entries = parse_entries(&json!({
            "READ_EXISTING_OBJECT": [{"userID": "u1"}, {"groupID": "g1"}],
            "WRITE_EXISTING_OBJECT": [{"userID": "u1"}],
        }))
        .unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.contains(&AclEntry {
            action: AclAction::ReadExistingObject,
            subject: AclSubject::Group("g1".to_string()),
        }));
    }

    #[test]
    fn test_parse_special_subjects() {
        let entries = parse_entries(&json!({
            "QUERY_OBJECTS_IN_BUCKET": [
                {"userID": "ANONYMOUS_USER"},
                {"userID": "ANY_AUTHENTICATED_USER"},
            ],
        }))
        .unwrap();
        assert_eq!(entries[0].subject, AclSubject::Anonymous);
        assert_eq!(entries[1].subject, AclSubject::Authenticated);
    }

    #[test]
    fn test_thing_subject_fails_loudly() {
        let err = parse_entries(&json!({
            "READ_EXISTING_OBJECT": [{"thingID": "th1"}],
        }))
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedEntity(_)));
    }

    #[test]
    fn test_unknown_action_is_skipped() {
        let entries = parse_entries(&json!({
            "SOME_FUTURE_ACTION": [{"userID": "u1"}],
            "DROP_BUCKET": [{"userID": "u1"}],
        }))
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AclAction::DropBucket);
    }

    #[test]
    fn test_subject_path_fragments() {
        assert_eq!(
            AclSubject::User("u1".to_string()).path_fragment(),
            "UserID:u1"
        );
        assert_eq!(
            AclSubject::Group("g1".to_string()).path_fragment(),
            "GroupID:g1"
        );
        assert_eq!(
            AclSubject::Anonymous.path_fragment(),
            "UserID:ANONYMOUS_USER"
        );
    }
}
