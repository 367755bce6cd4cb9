//! sc-rest: REST transport adapter for the stratus client SDK
//!
//! Implements the sc-core `Transport` trait over reqwest and carries the
//! thin endpoint wrappers that sit next to the core: authentication, user
//! registration, push installations, server-code invocation, ACL grants,
//! and object body transfer.

pub mod auth;
pub mod body;
pub mod client;
pub mod push;
pub mod servercode;

pub use auth::Session;
pub use body::ObjectBody;
pub use client::RestClient;
pub use push::{DeviceType, Installation, MqttEndpoint};
