//! Error taxonomy for versioned requests.
//!
//! Two failure kinds are recoverable: a server-side rejection of the requested
//! version (a `VERSION_MISMATCH` body) and a resolver-side detection of an
//! incompatible command encoding. Both are retried by the engine until the
//! retry budget is spent, after which they surface as [`VersionMismatchError`].
//! Every other failure ([`TransportError`], non-mismatch [`ResolveError`]s)
//! propagates to the caller unchanged and is never retried.
//!
//! | Kind | Produced by | Retried |
//! |------|-------------|---------|
//! | Server mismatch | `VERSION_MISMATCH` response body | Yes, against the redirect-resolved URL |
//! | Resolver mismatch | [`ResolveError::VersionMismatch`] | Yes, against the attempt's own URL |
//! | Resolver failure | [`ResolveError::InvalidDescriptor`], [`ResolveError::Other`] | No |
//! | Transport failure | [`TransportError`] | No |

use thiserror::Error;

/// Boxed error used to carry collaborator failures without naming their types.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Version mismatch
// ---------------------------------------------------------------------------

/// The server (or the resolver) disagrees with the requested protocol version.
///
/// `server_version` is the version reported as authoritative. It is empty when
/// the server rejected the request without naming a usable version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("protocol version mismatch: server expects version '{server_version}'")]
pub struct VersionMismatchError {
    /// The version the server reports as authoritative.
    pub server_version: String,
}

impl VersionMismatchError {
    /// Creates a mismatch error naming the server's version.
    pub fn new(server_version: impl Into<String>) -> Self {
        Self {
            server_version: server_version.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Failures raised by a [`crate::Transport`] or while decoding its response body.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The network call itself failed (connection, TLS, timeout, redirect loop).
    #[error("request to '{url}' failed: {source}")]
    Request {
        /// Target URL of the failed call, including the query suffix.
        url: String,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },

    /// The response body could not be read or is not valid JSON.
    #[error("response body from '{url}' is not valid JSON: {source}")]
    Decode {
        /// Resolved URL of the response whose body failed to decode.
        url: String,
        /// Underlying decoding error.
        #[source]
        source: BoxError,
    },

    /// The transport-init fields could not be turned into a request.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the rejected field.
        message: String,
    },
}

/// Failures raised by a [`crate::CommandResolver`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A descriptor is encoded for a different protocol version.
    #[error(transparent)]
    VersionMismatch(#[from] VersionMismatchError),

    /// A descriptor does not have the shape the resolver understands.
    #[error("command descriptor #{index} is invalid: {reason}")]
    InvalidDescriptor {
        /// Position of the offending descriptor in the server's array.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Any other resolver failure.
    #[error(transparent)]
    Other(BoxError),
}

// ---------------------------------------------------------------------------
// Request-level error
// ---------------------------------------------------------------------------

/// Errors returned by [`crate::Requester::request`].
#[derive(Debug, Error)]
pub enum RequestError {
    /// A version mismatch persisted after the retry budget was exhausted.
    #[error(transparent)]
    VersionMismatch(#[from] VersionMismatchError),

    /// The transport failed; never retried.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The resolver failed for a reason other than a version mismatch; never retried.
    #[error("command resolution failed: {0}")]
    Resolve(#[source] ResolveError),
}

impl RequestError {
    /// Returns the server-reported version if this is a version mismatch.
    pub fn server_version(&self) -> Option<&str> {
        match self {
            Self::VersionMismatch(err) => Some(&err.server_version),
            _ => None,
        }
    }
}

impl From<ResolveError> for RequestError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::VersionMismatch(mismatch) => Self::VersionMismatch(mismatch),
            other => Self::Resolve(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_mismatch_surfaces_unchanged() {
        let err: RequestError = ResolveError::from(VersionMismatchError::new("5")).into();
        assert_eq!(err.server_version(), Some("5"));
        assert!(matches!(err, RequestError::VersionMismatch(ref m) if m.server_version == "5"));
    }

    #[test]
    fn test_other_resolver_failure_is_wrapped() {
        let err: RequestError = ResolveError::InvalidDescriptor {
            index: 2,
            reason: "missing 'type'".into(),
        }
        .into();
        assert_eq!(err.server_version(), None);
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn test_mismatch_display_names_version() {
        let err = VersionMismatchError::new("7");
        assert!(err.to_string().contains("'7'"));
    }
}
