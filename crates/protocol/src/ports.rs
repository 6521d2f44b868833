//! Port traits implemented by infrastructure crates.
//!
//! The engine depends only on these traits. `http-transport` supplies a
//! [`Transport`] over `reqwest`, `resolver` supplies a [`CommandResolver`] for
//! JSON descriptors, and [`crate::Environment`] supplies the [`VersionStore`].
//! Tests substitute in-memory implementations of all three.

use async_trait::async_trait;
use serde_json::Value;

use crate::{ProtocolVersion, ResolveError, TransportError, TransportInit};

/// Performs one network call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Response type produced by this transport.
    type Response: TransportResponse;

    /// Issues a request against `url` with `init` forwarded untouched.
    ///
    /// Redirects are followed by the transport. A non-success status is not an
    /// error: its body is still handed back for inspection.
    async fn fetch(&self, url: &str, init: &TransportInit) -> Result<Self::Response, TransportError>;
}

/// A response whose body has not been read yet.
#[async_trait]
pub trait TransportResponse: Send {
    /// The URL the response was finally served from, after redirects.
    fn url(&self) -> &str;

    /// Reads the body and parses it as JSON, consuming the response.
    async fn json(self) -> Result<Value, TransportError>;
}

/// Turns raw command descriptors into typed commands.
#[async_trait]
pub trait CommandResolver: Send + Sync {
    /// The resolved command type.
    type Command: Send;

    /// Resolves `descriptors` that were requested with `version`.
    ///
    /// Fails with [`ResolveError::VersionMismatch`] when a descriptor is
    /// encoded for a different version than the one requested.
    async fn resolve(
        &self,
        descriptors: Vec<Value>,
        version: Option<&ProtocolVersion>,
    ) -> Result<Vec<Self::Command>, ResolveError>;
}

/// Read access to the last agreed protocol version.
pub trait VersionStore: Send + Sync {
    /// Returns the stored version, or `None` when nothing has been agreed yet.
    fn read_version(&self) -> Option<ProtocolVersion>;
}
