//! sc-core: Core library for the stratus cloud client SDK
//!
//! This crate provides the transport-independent core of the SDK:
//! - Resource handles and address resolution (`stratus://...` uris)
//! - The optimistic-concurrency persistence engine for objects and
//!   group membership
//! - Transfer descriptors for relocating object bodies
//! - Profile/configuration management
//!
//! The crate never talks to the network itself; everything that does goes
//! through the [`Transport`] trait, implemented by the `sc-rest` adapter.

pub mod acl;
pub mod context;
pub mod document;
pub mod error;
pub mod group;
pub mod object;
pub mod profile;
pub mod retry;
pub mod scope;
pub mod transfer;
pub mod transport;
pub mod uri;
pub mod validate;

pub use context::AppContext;
pub use document::{Document, RESERVED_PREFIX};
pub use error::{Error, Result};
pub use group::GroupHandle;
pub use object::ObjectHandle;
pub use profile::{AppProfile, ProfileManager};
pub use retry::{RetryConfig, is_endpoint_not_ready, retry_with_backoff};
pub use scope::{Bucket, BucketKind, CRYPTO_PREFIX, Owner, Resource, ThingHandle, UserHandle};
pub use transfer::{TargetScope, TransferTarget};
pub use transport::{ApiRequest, ApiResponse, Precondition, RequestBody, Transport};
pub use uri::{SCHEME, Segment, SegmentKind, Uri, resolve};
