//! Usage-analytics warehouse access.
//!
//! The warehouse is optional. `AnalyticsStore` resolves "is it configured?" once
//! at startup; the `Unconfigured` variant answers every read with an empty list
//! and accepts every write without doing anything.

pub mod bigquery;
#[cfg(feature = "test-utils")]
pub mod fake;

pub use bigquery::BigQueryClient;

use crate::core::SuggestionSource;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("warehouse request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("warehouse returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("warehouse returned an unreadable body: {0}")]
    Decode(String),

    #[error("warehouse query did not finish before its timeout")]
    Incomplete,

    #[error("warehouse rejected rows: {}", .0.join("; "))]
    Insert(Vec<String>),
}

/// A read against the popular-domains table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainQuery {
    /// Domains starting with `prefix`, most looked-up first.
    Prefix { prefix: String, limit: usize },
    /// The most looked-up domains overall.
    Top { count: usize },
}

/// A configured analytics warehouse.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Runs a popularity query and returns the matching domains in rank order.
    async fn query_domains(&self, query: &DomainQuery) -> Result<Vec<String>, AnalyticsError>;

    /// Appends one row to `table`.
    async fn insert_row(&self, table: &str, row: serde_json::Value) -> Result<(), AnalyticsError>;
}

/// The analytics capability, present or absent.
#[derive(Clone, Default)]
pub enum AnalyticsStore {
    Configured {
        warehouse: Arc<dyn Warehouse>,
        suggestion_limit: usize,
    },
    #[default]
    Unconfigured,
}

impl std::fmt::Debug for AnalyticsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configured {
                suggestion_limit, ..
            } => f
                .debug_struct("Configured")
                .field("suggestion_limit", suggestion_limit)
                .finish_non_exhaustive(),
            Self::Unconfigured => f.write_str("Unconfigured"),
        }
    }
}

impl AnalyticsStore {
    pub fn new(warehouse: Arc<dyn Warehouse>, suggestion_limit: usize) -> Self {
        Self::Configured {
            warehouse,
            suggestion_limit,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured { .. })
    }

    /// Appends a row. A no-op when unconfigured.
    pub async fn insert_row(&self, table: &str, row: serde_json::Value) -> Result<(), AnalyticsError> {
        match self {
            Self::Configured { warehouse, .. } => warehouse.insert_row(table, row).await,
            Self::Unconfigured => Ok(()),
        }
    }
}

#[async_trait]
impl SuggestionSource for AnalyticsStore {
    async fn prefix_search(&self, prefix: &str) -> Result<Vec<String>, AnalyticsError> {
        match self {
            Self::Configured {
                warehouse,
                suggestion_limit,
            } => {
                let query = DomainQuery::Prefix {
                    prefix: prefix.to_lowercase(),
                    limit: *suggestion_limit,
                };
                warehouse.query_domains(&query).await
            }
            Self::Unconfigured => Ok(Vec::new()),
        }
    }

    async fn top_domains(&self, count: usize) -> Result<Vec<String>, AnalyticsError> {
        match self {
            Self::Configured { warehouse, .. } => {
                warehouse.query_domains(&DomainQuery::Top { count }).await
            }
            Self::Unconfigured => Ok(Vec::new()),
        }
    }
}
