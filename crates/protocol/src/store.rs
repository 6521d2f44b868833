//! The Version Store: an environment-scoped slot holding the last agreed
//! protocol version.
//!
//! The engine only ever reads the slot (through [`VersionStore`]). Writing it
//! is the business of the host, typically after a page load succeeded with a
//! known version.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::{ProtocolVersion, VersionStore};

/// Name of the environment slot holding the last agreed protocol version.
pub const VERSION_KEY: &str = "__CMDFETCH_PAGE_VERSION__";

/// A keyed slot map scoped to one execution environment.
///
/// [`Environment::ambient`] is the process-wide instance used when a request
/// does not name an environment of its own.
#[derive(Debug, Default)]
pub struct Environment {
    slots: RwLock<HashMap<String, String>>,
}

static AMBIENT: OnceLock<Arc<Environment>> = OnceLock::new();

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide environment.
    pub fn ambient() -> Arc<Environment> {
        AMBIENT
            .get_or_init(|| Arc::new(Environment::new()))
            .clone()
    }

    /// Writes `value` into the slot named `key`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Clears the slot named `key`, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Returns a copy of the slot named `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl VersionStore for Environment {
    fn read_version(&self) -> Option<ProtocolVersion> {
        self.get(VERSION_KEY).and_then(ProtocolVersion::new)
    }
}

/// A [`VersionStore`] that always reports the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedVersion(pub Option<ProtocolVersion>);

impl VersionStore for FixedVersion {
    fn read_version(&self) -> Option<ProtocolVersion> {
        self.0.clone()
    }
}
