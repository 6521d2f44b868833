//! Client configuration for [`crate::ReqwestTransport`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings applied when building the underlying `reqwest::Client`.
///
/// Deserialisable from the `[http]` table of the CLI configuration file; every
/// field is optional there and falls back to [`HttpConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds, redirects included. `0` disables it.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Maximum number of redirects followed per attempt. `0` disables redirects.
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("cmdfetch/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 10,
        }
    }
}

impl HttpConfig {
    /// Returns the client timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.max_redirects, 10);
        assert!(config.user_agent.starts_with("cmdfetch/"));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = HttpConfig {
            timeout_secs: 0,
            ..HttpConfig::default()
        };
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: HttpConfig = serde_json::from_str(r#"{"max_redirects": 2}"#).unwrap();
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_json::from_str::<HttpConfig>(r#"{"retries": 2}"#).is_err());
    }
}
