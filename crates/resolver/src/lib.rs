//! cmdfetch command resolver.
//!
//! Implements [`protocol::CommandResolver`] for JSON command descriptors of the
//! form `{"type": "<name>", ...}`. Every descriptor becomes a
//! [`protocol::Command`] whose `kind` is the `type` member and whose `fields`
//! are the remaining members.
//!
//! ## Version checks
//!
//! A descriptor may carry a `version` member naming the protocol version it was
//! encoded for. When the request was made with a known version and a
//! descriptor's version differs, resolution fails with
//! [`protocol::VersionMismatchError`] naming the descriptor's version, and the
//! engine retries with it. When no version was requested, embedded versions are
//! accepted as-is.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Descriptor validation lives here; the [`protocol`]
//! crate sees only [`protocol::CommandResolver`].

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use protocol::{Command, CommandResolver, ProtocolVersion, ResolveError, VersionMismatchError};

/// Descriptor member naming the command.
pub const TYPE_MEMBER: &str = "type";

/// Descriptor member naming the encoding version.
pub const VERSION_MEMBER: &str = "version";

/// Resolves `{"type": ...}` descriptors into [`Command`]s.
///
/// Resolution is all-or-nothing: the first invalid or mismatched descriptor
/// fails the whole batch.
#[derive(Debug, Clone, Default)]
pub struct DescriptorResolver;

impl DescriptorResolver {
    /// Creates a resolver.
    pub fn new() -> Self {
        Self
    }

    fn resolve_one(
        &self,
        index: usize,
        descriptor: Value,
        requested: Option<&ProtocolVersion>,
    ) -> Result<Command, ResolveError> {
        let mut members = match descriptor {
            Value::Object(members) => members,
            other => {
                return Err(ResolveError::InvalidDescriptor {
                    index,
                    reason: format!("expected an object, found {}", kind_of(&other)),
                })
            }
        };

        let kind = match members.remove(TYPE_MEMBER) {
            Some(Value::String(kind)) if !kind.is_empty() => kind,
            Some(other) => {
                return Err(ResolveError::InvalidDescriptor {
                    index,
                    reason: format!("'type' must be a non-empty string, found {}", kind_of(&other)),
                })
            }
            None => {
                return Err(ResolveError::InvalidDescriptor {
                    index,
                    reason: "missing 'type'".to_string(),
                })
            }
        };

        check_version(&members, requested)?;

        Ok(Command {
            kind,
            fields: members,
        })
    }
}

/// Fails when the descriptor names a version other than the requested one.
fn check_version(
    members: &Map<String, Value>,
    requested: Option<&ProtocolVersion>,
) -> Result<(), VersionMismatchError> {
    let Some(requested) = requested else {
        return Ok(());
    };
    let encoded = match members.get(VERSION_MEMBER) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Ok(()),
    };
    if encoded.is_empty() || encoded == requested.as_str() {
        Ok(())
    } else {
        Err(VersionMismatchError::new(encoded))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl CommandResolver for DescriptorResolver {
    type Command = Command;

    async fn resolve(
        &self,
        descriptors: Vec<Value>,
        version: Option<&ProtocolVersion>,
    ) -> Result<Vec<Command>, ResolveError> {
        let count = descriptors.len();
        let commands = descriptors
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| self.resolve_one(index, descriptor, version))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count, "Resolved command descriptors");
        Ok(commands)
    }
}
