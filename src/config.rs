//! Configuration management for domainlens
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer built-in defaults, a `domainlens.toml` file, environment
//! variables and command-line arguments, in that order.

use crate::certs::FailurePolicy;
use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "domainlens.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the certificate-transparency search.
    pub certificates: CertificatesConfig,
    /// Configuration for the analytics warehouse. Absent means lookups are not
    /// recorded and suggestions are always empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<AnalyticsConfig>,
    /// Configuration for CLI output.
    pub output: OutputConfig,
    /// Configuration for the HTTP API.
    pub server: ServerConfig,
}

/// Configuration for the certificate-transparency search.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CertificatesConfig {
    /// Base URL of the crt.sh-compatible search.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Behavior when one of the exact/wildcard queries fails.
    pub failure_policy: FailurePolicy,
}

/// Configuration for the analytics warehouse.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// BigQuery REST base URL.
    #[serde(default = "default_analytics_endpoint")]
    pub endpoint: String,
    pub project_id: String,
    pub dataset: String,
    /// Bearer token sent with every request, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default = "default_lookups_table")]
    pub lookups_table: String,
    #[serde(default = "default_popular_domains_table")]
    pub popular_domains_table: String,
    /// Maximum number of suggestions returned per prefix search.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_analytics_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_analytics_endpoint() -> String {
    "https://bigquery.googleapis.com/bigquery/v2".to_string()
}

fn default_lookups_table() -> String {
    "lookups".to_string()
}

fn default_popular_domains_table() -> String {
    "popular_domains".to_string()
}

fn default_suggestion_limit() -> usize {
    5
}

fn default_analytics_timeout_ms() -> u64 {
    10_000
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_analytics_endpoint(),
            project_id: String::new(),
            dataset: String::new(),
            access_token: None,
            lookups_table: default_lookups_table(),
            popular_domains_table: default_popular_domains_table(),
            suggestion_limit: default_suggestion_limit(),
            timeout_ms: default_analytics_timeout_ms(),
        }
    }
}

/// The format for CLI output.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    PlainText,
}

/// Configuration for CLI output.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Configuration for the HTTP API.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the API listens on.
    pub listen_addr: String,
    /// Serve Prometheus metrics at `/metrics`.
    pub metrics_enabled: bool,
}

impl Config {
    /// Loads the application configuration, layering defaults, the TOML file,
    /// `DOMAINLENS_`-prefixed environment variables and CLI arguments.
    ///
    /// Nested keys are addressed with `__` in the environment, e.g.
    /// `DOMAINLENS_CERTIFICATES__TIMEOUT_MS=5000`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("DOMAINLENS_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            certificates: CertificatesConfig {
                base_url: "https://crt.sh".to_string(),
                timeout_ms: 30_000,
                failure_policy: FailurePolicy::FailFast,
            },
            analytics: None,
            output: OutputConfig {
                format: OutputFormat::PlainText,
            },
            server: ServerConfig {
                listen_addr: "127.0.0.1:8080".to_string(),
                metrics_enabled: false,
            },
        }
    }
}
