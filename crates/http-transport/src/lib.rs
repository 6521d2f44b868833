//! cmdfetch HTTP transport adapter.
//!
//! Implements [`protocol::Transport`] over `reqwest`. Redirects are followed
//! by the client (up to [`HttpConfig::max_redirects`]) so the engine sees the
//! final URL through [`protocol::TransportResponse::url`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Client construction, method/header mapping, redirect
//! policy, and body decoding all live here. The [`protocol`] crate sees only
//! [`protocol::Transport`].
//!
//! ## Status codes
//!
//! A non-success status is not a transport failure. Servers report version
//! mismatches in the body, commonly alongside a `409`, so the body is always
//! handed back for classification.

mod config;
mod transport;

pub use config::HttpConfig;
pub use transport::{HttpResponse, ReqwestTransport};

use thiserror::Error;

/// Errors raised while constructing a [`ReqwestTransport`].
#[derive(Debug, Error)]
pub enum HttpTransportError {
    /// The TLS backend or client settings could not be initialised.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
