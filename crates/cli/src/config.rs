//! CLI configuration: the optional TOML file plus command-line overrides.
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//! max_redirects = 10
//!
//! [request]
//! retries = 1
//! version = "3"
//! page_version = "2"
//! method = "GET"
//! headers = { Accept = "application/json" }
//!
//! [observability]
//! log_format = "json"
//! otlp_endpoint = "http://localhost:4317"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use http_transport::HttpConfig;
use protocol::{ProtocolVersion, RequestOptions, DEFAULT_RETRIES};

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("cannot parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value is syntactically valid but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Format of log lines written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub http: HttpConfig,
    pub request: RequestConfig,
    pub observability: ObservabilityConfig,
}

/// Defaults for the request itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    /// Mismatch retry budget.
    pub retries: u32,
    /// Explicit protocol version override.
    pub version: Option<String>,
    /// Value written into the ambient Version Store slot before the request.
    pub page_version: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Headers from the config file.
    pub headers: BTreeMap<String, String>,
    /// Headers from `-H` flags, sent after the config file's.
    #[serde(skip)]
    pub extra_headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            version: None,
            page_version: None,
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            extra_headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestConfig {
    /// Builds the engine options. Empty versions count as unknown.
    pub fn to_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new()
            .with_retries(self.retries)
            .with_version(self.version.clone().and_then(ProtocolVersion::new))
            .with_method(self.method.as_str());
        for (name, value) in self.headers.iter().chain(
            self.extra_headers
                .iter()
                .map(|(name, value)| (name, value)),
        ) {
            options = options.with_header(name.as_str(), value.as_str());
        }
        if let Some(body) = &self.body {
            options = options.with_body(body.as_str());
        }
        options
    }
}

/// Logging and tracing export settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// OTLP/gRPC collector endpoint. Spans are only exported when set.
    pub otlp_endpoint: Option<String>,
}

impl CliConfig {
    /// Loads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("http.user_agent must not be empty".into()));
        }
        if self.request.method.trim().is_empty() {
            return Err(ConfigError::Invalid("request.method must not be empty".into()));
        }
        if let Some(endpoint) = &self.observability.otlp_endpoint {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "observability.otlp_endpoint must not be empty when set".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Splits a `-H "Name: value"` flag.
pub fn parse_header_flag(flag: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = flag
        .split_once(':')
        .ok_or_else(|| ConfigError::Invalid(format!("header '{flag}' is not 'Name: value'")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::Invalid(format!("header '{flag}' has no name")));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<CliConfig, toml::de::Error> {
        toml::from_str(text)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.request.retries, 1);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
            [http]
            timeout_secs = 5
            max_redirects = 3

            [request]
            retries = 2
            version = "3"
            page_version = "2"
            method = "POST"
            headers = { Accept = "application/json" }
            body = "{}"

            [observability]
            log_format = "json"
            otlp_endpoint = "http://localhost:4317"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.max_redirects, 3);
        assert_eq!(config.request.retries, 2);
        assert_eq!(config.request.version.as_deref(), Some("3"));
        assert_eq!(config.request.page_version.as_deref(), Some("2"));
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse("[request]\nretry = 2\n").is_err());
        assert!(parse("[cache]\nenabled = true\n").is_err());
    }

    #[test]
    fn test_negative_retries_rejected() {
        assert!(parse("[request]\nretries = -1\n").is_err());
    }

    #[test]
    fn test_validate_rejects_blank_values() {
        let mut config = CliConfig::default();
        config.request.method = " ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = CliConfig::default();
        config.observability.otlp_endpoint = Some(String::new());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_to_options() {
        let mut request = RequestConfig {
            retries: 3,
            version: Some("4".into()),
            method: "POST".into(),
            body: Some("{}".into()),
            ..RequestConfig::default()
        };
        request.headers.insert("Accept".into(), "application/json".into());
        request.extra_headers.push(("X-Trace".into(), "1".into()));

        let options = request.to_options();
        assert_eq!(options.retries, 3);
        assert_eq!(options.version, ProtocolVersion::new("4"));
        assert_eq!(options.init.method, "POST");
        assert_eq!(options.init.body.as_deref(), Some("{}"));
        assert_eq!(
            options.init.headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Trace".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_version_is_unknown() {
        let request = RequestConfig {
            version: Some(String::new()),
            ..RequestConfig::default()
        };
        assert_eq!(request.to_options().version, None);
    }

    #[test]
    fn test_parse_header_flag() {
        assert_eq!(
            parse_header_flag("Accept: application/json").unwrap(),
            ("Accept".to_string(), "application/json".to_string())
        );
        assert_eq!(
            parse_header_flag("X-Url:https://a/b").unwrap(),
            ("X-Url".to_string(), "https://a/b".to_string())
        );
        assert!(parse_header_flag("no-colon").is_err());
        assert!(parse_header_flag(": value").is_err());
    }
}
