//! [`protocol::Transport`] implementation over `reqwest`.

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{redirect, Client, Method};
use serde_json::Value;
use tracing::debug;

use protocol::{Transport, TransportError, TransportInit, TransportResponse};

use crate::{HttpConfig, HttpTransportError};

/// HTTP transport backed by a shared `reqwest::Client`.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport from `config`.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpTransportError> {
        let policy = if config.max_redirects == 0 {
            redirect::Policy::none()
        } else {
            redirect::Policy::limited(config.max_redirects)
        };

        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(policy);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(HttpTransportError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn parse_method(method: &str) -> Result<Method, TransportError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| {
        TransportError::InvalidRequest {
            message: format!("unsupported HTTP method '{method}'"),
        }
    })
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), TransportError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| TransportError::InvalidRequest {
            message: format!("invalid header name '{name}'"),
        })?;
    let header_value = HeaderValue::from_str(value).map_err(|_| TransportError::InvalidRequest {
        message: format!("invalid value for header '{name}'"),
    })?;
    Ok((header_name, header_value))
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Response = HttpResponse;

    async fn fetch(&self, url: &str, init: &TransportInit) -> Result<HttpResponse, TransportError> {
        let method = parse_method(&init.method)?;
        let mut request = self.client.request(method, url);

        for (name, value) in &init.headers {
            let (name, value) = parse_header(name, value)?;
            request = request.header(name, value);
        }
        if let Some(body) = &init.body {
            request = request.body(body.clone());
        }
        if let Some(timeout) = init.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_builder() {
                TransportError::InvalidRequest {
                    message: format!("invalid URL '{url}': {err}"),
                }
            } else {
                TransportError::Request {
                    url: url.to_string(),
                    source: Box::new(err),
                }
            }
        })?;

        debug!(
            status = response.status().as_u16(),
            final_url = %response.url(),
            "Response received"
        );
        Ok(HttpResponse { inner: response })
    }
}

/// A `reqwest` response whose body has not been read yet.
#[derive(Debug)]
pub struct HttpResponse {
    inner: reqwest::Response,
}

impl HttpResponse {
    /// HTTP status of the response.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }
}

#[async_trait]
impl TransportResponse for HttpResponse {
    fn url(&self) -> &str {
        self.inner.url().as_str()
    }

    async fn json(self) -> Result<Value, TransportError> {
        let url = self.inner.url().to_string();
        self.inner
            .json::<Value>()
            .await
            .map_err(|err| TransportError::Decode {
                url,
                source: Box::new(err),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_is_case_insensitive() {
        assert_eq!(parse_method("post").unwrap(), Method::POST);
        assert_eq!(parse_method("GET").unwrap(), Method::GET);
    }

    #[test]
    fn test_invalid_method_rejected() {
        assert!(matches!(
            parse_method("BAD METHOD"),
            Err(TransportError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_invalid_header_rejected() {
        assert!(parse_header("X-Ok", "fine").is_ok());
        assert!(matches!(
            parse_header("bad header", "v"),
            Err(TransportError::InvalidRequest { .. })
        ));
        assert!(matches!(
            parse_header("X-Ok", "line\nbreak"),
            Err(TransportError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_builds_with_redirects_disabled() {
        let config = HttpConfig {
            max_redirects: 0,
            ..HttpConfig::default()
        };
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
