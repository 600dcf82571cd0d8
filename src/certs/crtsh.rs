//! A client for the crt.sh certificate search.

use crate::certs::CertificateError;
use crate::config::CertificatesConfig;
use crate::core::{CertificateRecord, CertificateSource};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Queries crt.sh's JSON output for an identity.
pub struct CrtShClient {
    client: reqwest::Client,
    base_url: String,
}

impl CrtShClient {
    /// Creates a new `CrtShClient` against `base_url` (e.g. `https://crt.sh`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CertificateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("domainlens/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &CertificatesConfig) -> Result<Self, CertificateError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }
}

#[async_trait]
impl CertificateSource for CrtShClient {
    #[instrument(skip(self))]
    async fn query(&self, identity: &str) -> Result<Vec<CertificateRecord>, CertificateError> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("q", identity), ("output", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "crt.sh query failed");
            return Err(CertificateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<CertificateRecord> = serde_json::from_str(&body)?;
        debug!(count = records.len(), "crt.sh returned certificates");
        Ok(records)
    }
}
