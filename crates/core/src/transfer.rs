//! Transfer descriptor builder
//!
//! Relocating an object's binary payload needs a structured description of
//! the write target: owning scope, bucket, and object. The descriptor is
//! derived from the raw parsed segment sequence, not from the folded
//! handle, because the fold discards raw tokens.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::scope::{Bucket, BucketKind};
use crate::uri::{SegmentKind, Uri};

/// The owning scope of a transfer target
///
/// Things are not representable as a transfer-target owner; deriving one
/// fails instead of falling back to application scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TargetScope {
    /// Application scope
    #[serde(rename = "APP")]
    App,
    /// A user's scope
    #[serde(rename = "APP_AND_USER")]
    AppAndUser {
        /// Owning user id
        #[serde(rename = "userID")]
        user_id: String,
    },
    /// A group's scope
    #[serde(rename = "APP_AND_GROUP")]
    AppAndGroup {
        /// Owning group id
        #[serde(rename = "groupID")]
        group_id: String,
    },
}

/// A body-transfer write target
///
/// `bucket_kind` is omitted from the wire form for plain buckets; the
/// receiving protocol distinguishes "absent" from "plain".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferTarget {
    /// Owning scope
    #[serde(rename = "targetObjectScope")]
    pub scope: TargetScope,
    /// Bucket storage kind; present only for crypto buckets
    #[serde(rename = "targetBucketType", skip_serializing_if = "Option::is_none")]
    pub bucket_kind: Option<BucketKind>,
    /// Bucket id with any `CRYPTO:` prefix stripped
    #[serde(rename = "targetBucketID")]
    pub bucket_id: String,
    /// Object id
    #[serde(rename = "targetObjectID")]
    pub object_id: String,
}

impl TransferTarget {
    /// Derive a transfer target from a parsed address
    ///
    /// The address must terminate in an object segment; the scope comes
    /// from the outermost segment only, independent of nesting depth.
    pub fn from_uri(uri: &Uri) -> Result<Self> {
        let object_id = match uri.last() {
            Some(segment) if segment.kind == SegmentKind::Objects && !segment.value.is_empty() => {
                segment.value.clone()
            }
            Some(segment) if segment.kind == SegmentKind::Objects => {
                return Err(Error::MissingSegment {
                    kind: "objects",
                    uri: uri.to_string(),
                });
            }
            _ => return Err(Error::NotAnObject(uri.to_string())),
        };

        // Nearest enclosing bucket: the last bucket segment before the
        // terminal object segment.
        let raw_bucket = uri
            .segments()
            .iter()
            .rev()
            .skip(1)
            .find(|s| s.kind == SegmentKind::Buckets)
            .map(|s| s.value.as_str())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::MissingSegment {
                kind: "buckets",
                uri: uri.to_string(),
            })?;

        let scope = match uri.first().map(|s| (s.kind, s.value.as_str())) {
            Some((SegmentKind::Users, id)) => TargetScope::AppAndUser {
                user_id: id.to_string(),
            },
            Some((SegmentKind::Groups, id)) => TargetScope::AppAndGroup {
                group_id: id.to_string(),
            },
            Some((SegmentKind::Things, _)) => {
                return Err(Error::UnsupportedTransferTarget(format!(
                    "thing-scoped address cannot be a transfer target: {uri}"
                )));
            }
            _ => TargetScope::App,
        };

        let (kind, bucket_id) = Bucket::parse_name(raw_bucket);
        Ok(Self {
            scope,
            bucket_kind: match kind {
                BucketKind::Crypto => Some(BucketKind::Crypto),
                BucketKind::Plain => None,
            },
            bucket_id: bucket_id.to_string(),
            object_id,
        })
    }
}
