//! Versioned command-list requests for cmdfetch.
//!
//! This crate fetches a server-rendered command list, guards against the client
//! and server disagreeing about the protocol version, and retries automatically
//! when a mismatch is detected. Transports and command resolvers are supplied
//! by infrastructure crates through the traits in [`ports`].
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no network I/O
//! dependencies. It defines *what* is needed; infrastructure crates define
//! *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ProtocolVersion`, `RequestId`) |
//! | [`types`] | Options, results, commands, and wire-shape classification |
//! | [`errors`] | Mismatch, transport, resolver, and request error types |
//! | [`query`] | Query-suffix construction and removal |
//! | [`store`] | The Version Store slot (`Environment`, `VERSION_KEY`) |
//! | [`ports`] | `Transport`, `CommandResolver`, and `VersionStore` traits |
//! | [`engine`] | `Requester` and the mismatch-retry loop |

pub mod engine;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod query;
pub mod store;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use engine::Requester;
pub use errors::{
    BoxError, RequestError, ResolveError, TransportError, VersionMismatchError,
};
pub use identifiers::{ProtocolVersion, RequestId};
pub use ports::{CommandResolver, Transport, TransportResponse, VersionStore};
pub use query::QuerySuffix;
pub use store::{Environment, FixedVersion, VERSION_KEY};
pub use types::{
    Command, RequestOptions, RequestResult, TransportInit, WireResponse, DEFAULT_RETRIES,
    VERSION_MISMATCH_CODE,
};
