//! Address parsing and resolution
//!
//! Addresses are compact strings naming a resource by its ownership chain:
//! `stratus://users/U/buckets/B/objects/O`. Parsing splits the path into
//! (kind, value) segments; resolution folds the segments left to right into
//! a single typed [`Resource`]. Both steps are pure and perform no network
//! access.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::group::GroupHandle;
use crate::object::ObjectHandle;
use crate::scope::{Bucket, Owner, Resource, ThingHandle, UserHandle};

/// Address scheme marker
pub const SCHEME: &str = "stratus://";

/// Segment kinds permitted in an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// `users`
    Users,
    /// `groups`
    Groups,
    /// `things`
    Things,
    /// `buckets`
    Buckets,
    /// `objects`
    Objects,
}

impl SegmentKind {
    /// The token spelling of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            SegmentKind::Users => "users",
            SegmentKind::Groups => "groups",
            SegmentKind::Things => "things",
            SegmentKind::Buckets => "buckets",
            SegmentKind::Objects => "objects",
        }
    }
}

impl FromStr for SegmentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "users" => Ok(SegmentKind::Users),
            "groups" => Ok(SegmentKind::Groups),
            "things" => Ok(SegmentKind::Things),
            "buckets" => Ok(SegmentKind::Buckets),
            "objects" => Ok(SegmentKind::Objects),
            other => Err(Error::UnsupportedEntity(other.to_string())),
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (kind, value) pair of an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment kind
    pub kind: SegmentKind,
    /// Raw segment value; may be empty (identifier not yet assigned)
    pub value: String,
}

impl Segment {
    /// Construct a segment
    pub fn new(kind: SegmentKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// A parsed address: an ordered sequence of segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    segments: Vec<Segment>,
}

impl Uri {
    /// Parse an address string into segments
    ///
    /// The address must begin with the scheme marker. The remainder is
    /// split on `/` and paired into segments; an odd token count gets one
    /// empty trailing value appended rather than rejected, so
    /// `stratus://buckets/b/objects` addresses a not-yet-assigned object in
    /// bucket `b`.
    pub fn parse(address: &str) -> Result<Self> {
        let rest = address.strip_prefix(SCHEME).ok_or_else(|| {
            Error::InvalidUri(format!("address must start with '{SCHEME}': {address}"))
        })?;

        let mut tokens: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if tokens.len() % 2 != 0 {
            tokens.push("");
        }

        let segments = tokens
            .chunks_exact(2)
            .map(|pair| Ok(Segment::new(pair[0].parse::<SegmentKind>()?, pair[1])))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { segments })
    }

    /// Build a uri from segments
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// The parsed segments, in address order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The outermost segment, if any
    pub fn first(&self) -> Option<&Segment> {
        self.segments.first()
    }

    /// The terminal segment, if any
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Fold the segments into a single resolved resource
    ///
    /// Walks left to right keeping a current handle: owner segments may
    /// appear once at the front, a bucket wraps the owner held so far, an
    /// object requires an enclosing bucket, and a thing becomes current
    /// regardless of position. An empty address is an error.
    pub fn resolve(&self) -> Result<Resource> {
        let mut current: Option<Resource> = None;

        for segment in &self.segments {
            let next = match segment.kind {
                SegmentKind::Users => match current {
                    None => Resource::User(match opt_id(&segment.value) {
                        Some(id) => UserHandle::with_id(id),
                        None => UserHandle::new(),
                    }),
                    Some(_) => {
                        return Err(Error::InvalidUri(format!(
                            "misplaced owner segment 'users' in '{self}'"
                        )));
                    }
                },
                SegmentKind::Groups => match current {
                    None => Resource::Group(match opt_id(&segment.value) {
                        Some(id) => GroupHandle::with_id(id),
                        None => GroupHandle::new(""),
                    }),
                    Some(_) => {
                        return Err(Error::InvalidUri(format!(
                            "misplaced owner segment 'groups' in '{self}'"
                        )));
                    }
                },
                SegmentKind::Things => Resource::Thing(match opt_id(&segment.value) {
                    Some(id) => ThingHandle::with_id(id),
                    None => ThingHandle::new(),
                }),
                SegmentKind::Buckets => {
                    let owner = match current.take() {
                        None => None,
                        Some(Resource::User(u)) => Some(Owner::User(u)),
                        Some(Resource::Group(g)) => Some(Owner::Group(g)),
                        Some(Resource::Thing(t)) => Some(Owner::Thing(t)),
                        Some(Resource::Bucket(_)) | Some(Resource::Object(_)) => {
                            return Err(Error::InvalidUri(format!(
                                "bucket segment cannot follow a bucket or object in '{self}'"
                            )));
                        }
                    };
                    Resource::Bucket(Bucket::scoped(owner, &segment.value))
                }
                SegmentKind::Objects => match current.take() {
                    Some(Resource::Bucket(bucket)) => {
                        Resource::Object(match opt_id(&segment.value) {
                            Some(id) => ObjectHandle::with_id(bucket, id),
                            None => ObjectHandle::new(bucket),
                        })
                    }
                    _ => {
                        return Err(Error::InvalidUri(format!(
                            "object segment requires an enclosing bucket in '{self}'"
                        )));
                    }
                },
            };
            current = Some(next);
        }

        current.ok_or_else(|| Error::InvalidUri("empty address".to_string()))
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SCHEME)?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}/{}", segment.kind, segment.value)?;
        }
        Ok(())
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse and resolve an address in one step
pub fn resolve(address: &str) -> Result<Resource> {
    Uri::parse(address)?.resolve()
}

fn opt_id(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::BucketKind;

    #[test]
    fn test_resolve_user_bucket_object() {
        let resource = resolve("stratus://users/U/buckets/B/objects/O").unwrap();
        let Resource::Object(object) = resource else {
            panic!("expected object");
        };
        assert_eq!(object.id(), Some("O"));
        assert_eq!(object.bucket().name(), "B");
        match object.bucket().owner() {
            Some(Owner::User(u)) => assert_eq!(u.id(), Some("U")),
            other => panic!("unexpected owner: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_app_scoped_bucket() {
        let resource = resolve("stratus://buckets/box").unwrap();
        let Resource::Bucket(bucket) = resource else {
            panic!("expected bucket");
        };
        assert_eq!(bucket.name(), "box");
        assert!(bucket.owner().is_none());
    }

    #[test]
    fn test_resolve_group_scoped_object() {
        let resource = resolve("stratus://groups/G1/buckets/shared/objects/o9").unwrap();
        let Resource::Object(object) = resource else {
            panic!("expected object");
        };
        match object.bucket().owner() {
            Some(Owner::Group(g)) => assert_eq!(g.id(), Some("G1")),
            other => panic!("unexpected owner: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_crypto_bucket_name_stripped() {
        let resource = resolve("stratus://users/U/buckets/CRYPTO:vault/objects/o").unwrap();
        let Resource::Object(object) = resource else {
            panic!("expected object");
        };
        assert_eq!(object.bucket().name(), "vault");
        assert_eq!(object.bucket().kind(), BucketKind::Crypto);
    }

    #[test]
    fn test_resolve_thing_terminal() {
        let resource = resolve("stratus://things/th.123").unwrap();
        let Resource::Thing(thing) = resource else {
            panic!("expected thing");
        };
        assert_eq!(thing.id(), Some("th.123"));
    }

    #[test]
    fn test_resolve_empty_address() {
        let err = resolve("stratus://").unwrap_err();
        match err {
            Error::InvalidUri(msg) => assert!(msg.contains("empty"), "got: {msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_missing_scheme() {
        assert!(matches!(
            resolve("users/U/buckets/B"),
            Err(Error::InvalidUri(_))
        ));
    }

    #[test]
    fn test_resolve_duplicate_owner() {
        assert!(matches!(
            resolve("stratus://users/U1/users/U2"),
            Err(Error::InvalidUri(_))
        ));
        assert!(matches!(
            resolve("stratus://users/U1/groups/G1/buckets/b"),
            Err(Error::InvalidUri(_))
        ));
    }

    #[test]
    fn test_resolve_unknown_kind() {
        match resolve("stratus://gadgets/g1") {
            Err(Error::UnsupportedEntity(kind)) => assert_eq!(kind, "gadgets"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_object_outside_bucket() {
        assert!(matches!(
            resolve("stratus://objects/o1"),
            Err(Error::InvalidUri(_))
        ));
        assert!(matches!(
            resolve("stratus://users/U/objects/o1"),
            Err(Error::InvalidUri(_))
        ));
    }

    #[test]
    fn test_resolve_bucket_cannot_own_bucket() {
        assert!(matches!(
            resolve("stratus://buckets/a/buckets/b"),
            Err(Error::InvalidUri(_))
        ));
        assert!(matches!(
            resolve("stratus://buckets/a/objects/o/buckets/b"),
            Err(Error::InvalidUri(_))
        ));
    }

    #[test]
    fn test_odd_segment_leniency() {
        // Trailing kind without a value resolves with the id unassigned
        let resource = resolve("stratus://buckets/b/objects").unwrap();
        let Resource::Object(object) = resource else {
            panic!("expected object");
        };
        assert_eq!(object.id(), None);
    }

    #[test]
    fn test_display_round_trip() {
        let address = "stratus://users/U/buckets/CRYPTO:vault/objects/O";
        let uri = Uri::parse(address).unwrap();
        assert_eq!(uri.to_string(), address);
        assert_eq!(address.parse::<Uri>().unwrap(), uri);
    }

    #[test]
    fn test_segments_preserve_raw_values() {
        let uri = Uri::parse("stratus://users/U/buckets/CRYPTO:vault/objects/O").unwrap();
        let kinds: Vec<_> = uri.segments().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Users, SegmentKind::Buckets, SegmentKind::Objects]
        );
        // Raw bucket token keeps the prefix; only the fold strips it
        assert_eq!(uri.segments()[1].value, "CRYPTO:vault");
    }
}
