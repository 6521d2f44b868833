//! Value types exchanged with callers, transports, and resolvers.
//!
//! [`RequestOptions`] and [`RequestResult`] are the caller-facing contract of
//! [`crate::Requester::request`]. [`TransportInit`] is the part of the options
//! forwarded verbatim to the [`crate::Transport`]. [`WireResponse`] is the
//! validated shape of a parsed response body; all branching in the engine
//! happens on it rather than on raw JSON.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{ProtocolVersion, VersionStore};

/// Value of the `error` member by which a server rejects a requested version.
pub const VERSION_MISMATCH_CODE: &str = "VERSION_MISMATCH";

/// Default number of mismatch-triggered retries.
pub const DEFAULT_RETRIES: u32 = 1;

// ---------------------------------------------------------------------------
// Transport init
// ---------------------------------------------------------------------------

/// Transport fields forwarded untouched on every attempt of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportInit {
    /// HTTP method, matched case-insensitively by transports. Defaults to `GET`.
    pub method: String,
    /// Request headers in the order they are sent.
    pub headers: Vec<(String, String)>,
    /// Request body, if any.
    pub body: Option<String>,
    /// Per-attempt timeout enforced by the transport.
    ///
    /// The engine imposes no timeout of its own; dropping the future returned
    /// by [`crate::Requester::request`] cancels the attempt in flight.
    pub timeout: Option<Duration>,
}

impl Default for TransportInit {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Request options
// ---------------------------------------------------------------------------

/// Options accepted by [`crate::Requester::request`].
///
/// # Example
///
/// ```
/// use protocol::{ProtocolVersion, RequestOptions};
///
/// let options = RequestOptions::new()
///     .with_version(ProtocolVersion::new("3"))
///     .with_retries(2)
///     .with_header("Accept", "application/json");
/// assert_eq!(options.retries, 2);
/// ```
#[derive(Clone)]
pub struct RequestOptions {
    /// Explicit version override. Takes precedence over the Version Store.
    pub version: Option<ProtocolVersion>,
    /// Budget of mismatch-triggered retries. `0` makes the first mismatch fatal.
    pub retries: u32,
    /// Environment to read the Version Store from. `None` uses the requester's
    /// ambient environment.
    pub environment: Option<Arc<dyn VersionStore>>,
    /// Transport fields forwarded verbatim.
    pub init: TransportInit,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            version: None,
            retries: DEFAULT_RETRIES,
            environment: None,
            init: TransportInit::default(),
        }
    }
}

impl std::fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("version", &self.version)
            .field("retries", &self.retries)
            .field("environment", &self.environment.as_ref().map(|_| ".."))
            .field("init", &self.init)
            .finish()
    }
}

impl RequestOptions {
    /// Creates options with the default retry budget and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the explicit version override. `None` clears it.
    #[must_use]
    pub fn with_version(mut self, version: Option<ProtocolVersion>) -> Self {
        self.version = version;
        self
    }

    /// Set the mismatch retry budget.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Read the Version Store from `environment` instead of the ambient one.
    #[must_use]
    pub fn with_environment(mut self, environment: Arc<dyn VersionStore>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Set the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.init.method = method.into();
        self
    }

    /// Append a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.init.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.init.body = Some(body.into());
        self
    }

    /// Set the per-attempt transport timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.init.timeout = Some(timeout);
        self
    }
}

// ---------------------------------------------------------------------------
// Request result
// ---------------------------------------------------------------------------

/// Outcome of a successful request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestResult<C> {
    /// Version sent on the final attempt. Serialised as `""` when unknown.
    #[serde(serialize_with = "serialize_version")]
    pub version: Option<ProtocolVersion>,
    /// Redirect-resolved URL with the query suffix removed.
    pub url: String,
    /// Resolved commands; empty when the server returned a non-array body.
    pub commands: Vec<C>,
}

impl<C> RequestResult<C> {
    /// Returns the effective version as sent on the wire (`""` when unknown).
    pub fn version_str(&self) -> &str {
        self.version.as_ref().map_or("", ProtocolVersion::as_str)
    }
}

fn serialize_version<S: Serializer>(
    version: &Option<ProtocolVersion>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(version.as_ref().map_or("", ProtocolVersion::as_str))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A resolved command: a named unit of work plus its arguments.
///
/// The engine never inspects commands; it only forwards what the resolver
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command name, taken from the descriptor's `type` member.
    #[serde(rename = "type")]
    pub kind: String,
    /// Remaining descriptor members.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Wire response classification
// ---------------------------------------------------------------------------

/// Validated shape of a parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum WireResponse {
    /// The server refused the requested version.
    Mismatch {
        /// Version the server reports as authoritative, if it named one.
        server_version: Option<ProtocolVersion>,
    },
    /// An array of raw command descriptors awaiting resolution.
    Commands(Vec<Value>),
    /// Any other JSON value; treated as "no commands".
    Other,
}

impl WireResponse {
    /// Classifies a parsed body.
    ///
    /// A body is a mismatch only when it is an object whose `error` member is
    /// exactly [`VERSION_MISMATCH_CODE`]. A numeric `serverVersion` is accepted
    /// and rendered as text; any other non-string value counts as absent.
    pub fn classify(body: Value) -> Self {
        match body {
            Value::Array(descriptors) => Self::Commands(descriptors),
            Value::Object(map)
                if map.get("error").and_then(Value::as_str) == Some(VERSION_MISMATCH_CODE) =>
            {
                let server_version = match map.get("serverVersion") {
                    Some(Value::String(s)) => ProtocolVersion::new(s.as_str()),
                    Some(Value::Number(n)) => ProtocolVersion::new(n.to_string()),
                    _ => None,
                };
                Self::Mismatch { server_version }
            }
            _ => Self::Other,
        }
    }
}
