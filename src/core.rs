//! Core domain types and service traits for domainlens
//!
//! This module defines the data structures returned to callers and the trait
//! contracts of the external collaborators (certificate log search, analytics
//! warehouse) the lookup logic is built around.

use crate::analytics::AnalyticsError;
use crate::certs::CertificateError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Naive layouts crt.sh has been seen to use for timestamps. `%.f` also matches
/// an absent fractional part.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A single certificate-transparency log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CertificateRecord {
    /// Unique log entry identifier
    pub id: u64,
    /// Identifier of the issuing CA, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_ca_id: Option<u64>,
    /// Distinguished name of the issuer
    pub issuer_name: String,
    /// Subject common name
    pub common_name: String,
    /// Newline-delimited subject alternative names
    pub name_value: String,
    /// When the entry was logged
    pub entry_timestamp: String,
    /// Start of the validity window
    pub not_before: String,
    /// End of the validity window
    pub not_after: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

impl CertificateRecord {
    /// Returns the individual identities listed in `name_value`.
    pub fn identities(&self) -> Vec<&str> {
        self.name_value
            .split('\n')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Parses `entry_timestamp` into an instant. Returns `None` when the value is
    /// in no known layout.
    pub fn logged_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.entry_timestamp)
    }
}

/// Parses an RFC 3339 timestamp or a naive UTC timestamp as emitted by crt.sh.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// A caller's lookup, before it is turned into a warehouse row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub domain: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub is_bot: bool,
}

/// One row of the `lookups` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LookupEvent {
    pub domain: String,
    pub base_domain: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    pub ip: String,
    pub user_agent: Option<String>,
    pub is_bot: bool,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Searches certificate-transparency logs.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Returns the certificate history for an exact domain or a `*.`-prefixed
    /// wildcard identity.
    ///
    /// # Returns
    /// * `Ok(records)`, possibly empty, on success
    /// * `Err` for transport, status or decoding failures
    async fn query(&self, identity: &str) -> Result<Vec<CertificateRecord>, CertificateError>;
}

/// Provides domain suggestions ranked by historical lookup popularity.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Case-insensitive prefix match, most popular first, capped by the source.
    async fn prefix_search(&self, prefix: &str) -> Result<Vec<String>, AnalyticsError>;

    /// The `count` most popular domains overall, most popular first.
    async fn top_domains(&self, count: usize) -> Result<Vec<String>, AnalyticsError>;
}
