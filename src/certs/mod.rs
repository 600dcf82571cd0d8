//! Certificate-transparency aggregation.
//!
//! A lookup for `www.example.com` asks the certificate source for the exact
//! domain and, concurrently, for the wildcard one level up (`*.example.com`).
//! Both answers are merged into one set ordered by logged time, newest first.

pub mod crtsh;
#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use crtsh::CrtShClient;

use crate::core::{CertificateRecord, CertificateSource};
use crate::domain::{self, DomainError};
use chrono::{DateTime, Utc};
use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("certificate search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("certificate search returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("certificate search returned an unreadable body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// What to do when one of the concurrent certificate queries fails.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed query fails the whole lookup.
    #[default]
    FailFast,
    /// A failed query counts as an empty result. The lookup only fails when
    /// every query failed.
    Degrade,
}

/// Certificates ordered by `entry_timestamp`, newest first.
///
/// Ties and entries whose timestamp cannot be parsed keep their input order;
/// unparseable entries sort after every parseable one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct CertificateResultSet(Vec<CertificateRecord>);

impl CertificateResultSet {
    /// Sorts `records` into a result set. This is the only constructor.
    pub fn from_unsorted(records: Vec<CertificateRecord>) -> Self {
        let mut keyed: Vec<(Option<DateTime<Utc>>, CertificateRecord)> = records
            .into_iter()
            .map(|record| (record.logged_at(), record))
            .collect();
        // `sort_by` is stable, and `None` orders below any `Some`.
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
        Self(keyed.into_iter().map(|(_, record)| record).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CertificateRecord> {
        self.0.iter()
    }
}

/// Returns the identities a lookup for `domain` queries, exact domain first.
pub fn queries_for(domain: &str) -> Result<Vec<String>, DomainError> {
    let mut queries = vec![domain.to_string()];
    if domain::has_parent_domain(domain) {
        queries.push(domain::wildcard_parent(domain)?);
    }
    Ok(queries)
}

/// Merges exact and wildcard certificate history for a domain.
pub struct CertificateAggregator {
    source: Arc<dyn CertificateSource>,
    policy: FailurePolicy,
}

impl CertificateAggregator {
    pub fn new(source: Arc<dyn CertificateSource>, policy: FailurePolicy) -> Self {
        Self { source, policy }
    }

    /// Looks up every certificate logged for `domain` or its parent wildcard.
    ///
    /// Records are not de-duplicated: a certificate matched by both the exact
    /// and the wildcard query appears twice.
    #[instrument(skip(self), fields(policy = ?self.policy))]
    pub async fn lookup(&self, domain: &str) -> Result<CertificateResultSet, CertificateError> {
        let queries = queries_for(domain)?;
        let start = Instant::now();

        let batches = match self.policy {
            FailurePolicy::FailFast => {
                try_join_all(queries.iter().map(|identity| self.query(identity))).await?
            }
            FailurePolicy::Degrade => {
                let results = join_all(queries.iter().map(|identity| self.query(identity))).await;
                let mut batches = Vec::with_capacity(results.len());
                let mut first_error = None;
                for (identity, result) in queries.iter().zip(results) {
                    match result {
                        Ok(records) => batches.push(records),
                        Err(e) => {
                            warn!(identity = %identity, error = %e, "Certificate query failed, continuing without it");
                            first_error.get_or_insert(e);
                        }
                    }
                }
                if batches.is_empty() {
                    if let Some(e) = first_error {
                        return Err(e);
                    }
                }
                batches
            }
        };

        let result = CertificateResultSet::from_unsorted(batches.into_iter().flatten().collect());
        metrics::histogram!("certificate_lookup_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        debug!(count = result.len(), queries = queries.len(), "Certificate lookup complete");
        Ok(result)
    }

    async fn query(&self, identity: &str) -> Result<Vec<CertificateRecord>, CertificateError> {
        let result = self.source.query(identity).await;
        let status = if result.is_ok() { "success" } else { "failure" };
        metrics::counter!("certificate_queries_total", "status" => status).increment(1);
        result
    }
}
