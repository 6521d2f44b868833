//! The versioned request engine.
//!
//! One call to [`Requester::request`] is a bounded loop of attempts. Each
//! attempt resolves the effective version, issues the network call with the
//! query suffix appended, classifies the body, and either finishes or retries
//! with a decremented budget:
//!
//! ```text
//!            ┌──────────────────────── server mismatch ─────────────────────┐
//!            │                (retry against redirect-resolved URL)         │
//!            ▼                                                              │
//!   attempt{url, version, retries_left} ──fetch──► classify body ───────────┤
//!            ▲                                         │                    │
//!            │                                    array│      other ──► Ok(empty)
//!            │                                         ▼
//!            └──── resolver mismatch ◄──────────── resolve ──► Ok(commands)
//!              (retry against the attempt's own URL)
//! ```
//!
//! The two retry paths deliberately target different URLs. A server mismatch is
//! detected after any redirect already happened, so the retry goes straight to
//! the resolved location. A resolver mismatch is a content disagreement that has
//! nothing to do with routing, so the retry re-issues the attempt's own URL and
//! lets the redirect chain play out again with the corrected version.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    CommandResolver, Environment, ProtocolVersion, QuerySuffix, RequestError, RequestId,
    RequestOptions, RequestResult, ResolveError, Transport, TransportResponse,
    VersionMismatchError, VersionStore, WireResponse,
};

/// State threaded from one attempt to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attempt {
    url: String,
    version: Option<ProtocolVersion>,
    retries_left: u32,
}

impl Attempt {
    /// Next attempt against `url` with `version` as the explicit override.
    ///
    /// Callers check `retries_left > 0` first.
    fn retry(self, url: String, version: Option<ProtocolVersion>) -> Self {
        Self {
            url,
            version,
            retries_left: self.retries_left - 1,
        }
    }
}

/// Issues versioned command-list requests through injected ports.
///
/// # Example
///
/// ```no_run
/// # async fn run<T: protocol::Transport, R: protocol::CommandResolver>(transport: T, resolver: R)
/// # -> Result<(), protocol::RequestError> {
/// use protocol::{RequestOptions, Requester};
///
/// let requester = Requester::new(transport, resolver);
/// let result = requester
///     .request("https://example.com/page", RequestOptions::new())
///     .await?;
/// println!("{} commands at {}", result.commands.len(), result.url);
/// # Ok(())
/// # }
/// ```
pub struct Requester<T, R> {
    transport: T,
    resolver: R,
    environment: Arc<dyn VersionStore>,
}

impl<T, R> Requester<T, R>
where
    T: Transport,
    R: CommandResolver,
{
    /// Creates a requester reading versions from [`Environment::ambient`].
    pub fn new(transport: T, resolver: R) -> Self {
        Self {
            transport,
            resolver,
            environment: Environment::ambient(),
        }
    }

    /// Replace the ambient environment used when options name none.
    #[must_use]
    pub fn with_environment(mut self, environment: Arc<dyn VersionStore>) -> Self {
        self.environment = environment;
        self
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Fetches and resolves the command list at `url`.
    ///
    /// Mismatches reported by the server or detected by the resolver are
    /// retried up to `options.retries` times; once the budget is spent the call
    /// fails with [`RequestError::VersionMismatch`] carrying the last version
    /// reported. Transport failures and other resolver failures are returned
    /// unchanged without retrying.
    #[instrument(
        name = "request",
        skip(self, options),
        fields(request_id = %RequestId::new_random(), retries = options.retries)
    )]
    pub async fn request(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<RequestResult<R::Command>, RequestError> {
        let RequestOptions {
            version,
            retries,
            environment,
            init,
        } = options;
        let environment = environment.unwrap_or_else(|| Arc::clone(&self.environment));

        let mut attempt = Attempt {
            url: url.to_owned(),
            version,
            retries_left: retries,
        };

        loop {
            let version = attempt
                .version
                .clone()
                .or_else(|| environment.read_version());
            let suffix = QuerySuffix::new(&attempt.url, version.as_ref());
            let target = suffix.apply(&attempt.url);

            debug!(
                target_url = %target,
                version = version.as_ref().map_or("", ProtocolVersion::as_str),
                retries_left = attempt.retries_left,
                "Issuing attempt"
            );

            let response = self.transport.fetch(&target, &init).await?;
            let final_url = suffix.strip(response.url());
            let body = response.json().await?;

            match WireResponse::classify(body) {
                WireResponse::Mismatch { server_version } => {
                    if attempt.retries_left == 0 {
                        warn!(
                            server_version = server_version.as_ref().map_or("", ProtocolVersion::as_str),
                            "Server rejected version; retry budget exhausted"
                        );
                        return Err(VersionMismatchError::new(
                            server_version.map(|v| v.to_string()).unwrap_or_default(),
                        )
                        .into());
                    }
                    warn!(
                        server_version = server_version.as_ref().map_or("", ProtocolVersion::as_str),
                        retry_url = %final_url,
                        "Server rejected version; retrying"
                    );
                    attempt = attempt.retry(final_url, server_version);
                }
                WireResponse::Other => {
                    debug!(url = %final_url, "Response carries no commands");
                    return Ok(RequestResult {
                        version,
                        url: final_url,
                        commands: Vec::new(),
                    });
                }
                WireResponse::Commands(descriptors) => {
                    match self.resolver.resolve(descriptors, version.as_ref()).await {
                        Ok(commands) => {
                            debug!(url = %final_url, commands = commands.len(), "Commands resolved");
                            return Ok(RequestResult {
                                version,
                                url: final_url,
                                commands,
                            });
                        }
                        Err(ResolveError::VersionMismatch(err)) if attempt.retries_left > 0 => {
                            warn!(
                                server_version = %err.server_version,
                                retry_url = %attempt.url,
                                "Resolver detected version mismatch; retrying"
                            );
                            let url = attempt.url.clone();
                            attempt = attempt.retry(url, ProtocolVersion::new(err.server_version));
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_decrements_budget_and_replaces_target() {
        let attempt = Attempt {
            url: "https://x/a".into(),
            version: None,
            retries_left: 2,
        };
        let next = attempt.retry("https://x/b".into(), ProtocolVersion::new("4"));
        assert_eq!(
            next,
            Attempt {
                url: "https://x/b".into(),
                version: ProtocolVersion::new("4"),
                retries_left: 1,
            }
        );
    }
}
