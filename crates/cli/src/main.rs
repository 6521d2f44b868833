//! cmdfetch CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load the optional TOML file named by `--config`,
//!    validate it, and apply command-line overrides on top.
//! 2. **Wire observability**: configure `tracing-subscriber` with a pretty or
//!    JSON layer on stderr and, when an endpoint is configured, an OpenTelemetry
//!    OTLP exporter. All `tracing` spans and events emitted by every crate in the
//!    workspace flow through this layer.
//! 3. **Seed the Version Store**: write `--page-version` into the ambient
//!    environment slot, acting as the host that owns it.
//! 4. **Construct infrastructure**: create `ReqwestTransport` and
//!    `DescriptorResolver` and inject them into a `Requester`.
//! 5. **Run one request**: print the result as JSON on stdout.

mod config;
mod observability;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use http_transport::ReqwestTransport;
use protocol::{Command, Environment, RequestResult, Requester, VERSION_KEY};
use resolver::DescriptorResolver;

use crate::config::{parse_header_flag, CliConfig, LogFormat};

/// Fetch a server-rendered command list, negotiating the protocol version.
#[derive(Debug, Parser)]
#[command(name = "cmdfetch", version)]
struct Args {
    /// Page URL; may already carry a query string.
    url: String,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Explicit protocol version to request.
    #[arg(long = "protocol-version")]
    protocol_version: Option<String>,

    /// Number of mismatch-triggered retries.
    #[arg(long)]
    retries: Option<u32>,

    /// Last known-good version to place in the Version Store.
    #[arg(long)]
    page_version: Option<String>,

    /// HTTP method.
    #[arg(long)]
    method: Option<String>,

    /// Extra request header as "Name: value"; repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body.
    #[arg(long)]
    data: Option<String>,

    /// Log line format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    /// Applies command-line overrides on top of the file configuration.
    fn apply(&self, config: &mut CliConfig) -> anyhow::Result<()> {
        let request = &mut config.request;
        if let Some(version) = &self.protocol_version {
            request.version = Some(version.clone());
        }
        if let Some(retries) = self.retries {
            request.retries = retries;
        }
        if let Some(page_version) = &self.page_version {
            request.page_version = Some(page_version.clone());
        }
        if let Some(method) = &self.method {
            request.method = method.clone();
        }
        for flag in &self.headers {
            request.extra_headers.push(parse_header_flag(flag)?);
        }
        if let Some(data) = &self.data {
            request.body = Some(data.clone());
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        config.validate()?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    args.apply(&mut config)?;

    let telemetry = observability::init(&config.observability)?;
    let outcome = run(&args.url, &config).await;
    telemetry.shutdown();

    let result = outcome?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run(url: &str, config: &CliConfig) -> anyhow::Result<RequestResult<Command>> {
    if let Some(page_version) = &config.request.page_version {
        Environment::ambient().set(VERSION_KEY, page_version.as_str());
    }

    let transport =
        ReqwestTransport::new(&config.http).context("failed to construct HTTP transport")?;
    let requester = Requester::new(transport, DescriptorResolver::new());

    info!(url, retries = config.request.retries, "Fetching command list");
    let result = requester
        .request(url, config.request.to_options())
        .await
        .with_context(|| format!("request to '{url}' failed"))?;
    info!(
        url = %result.url,
        version = result.version_str(),
        commands = result.commands.len(),
        "Command list fetched"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "cmdfetch",
            "https://x/y",
            "--protocol-version",
            "3",
            "--retries",
            "0",
            "-H",
            "Accept: application/json",
            "--log-format",
            "json",
        ]);
        let mut config = CliConfig::default();
        args.apply(&mut config).unwrap();

        assert_eq!(config.request.version.as_deref(), Some("3"));
        assert_eq!(config.request.retries, 0);
        assert_eq!(
            config.request.extra_headers,
            vec![("Accept".to_string(), "application/json".to_string())]
        );
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_malformed_header_flag_rejected() {
        let args = Args::parse_from(["cmdfetch", "https://x/y", "-H", "nonsense"]);
        assert!(args.apply(&mut CliConfig::default()).is_err());
    }

    #[test]
    fn test_negative_retries_rejected_by_parser() {
        assert!(Args::try_parse_from(["cmdfetch", "https://x/y", "--retries", "-1"]).is_err());
    }
}
