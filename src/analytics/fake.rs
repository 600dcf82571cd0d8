use crate::analytics::{AnalyticsError, DomainQuery, Warehouse};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// In-memory warehouse for testing.
///
/// Prefix queries answer from a table keyed by the (already lowercased) prefix;
/// inserted rows are kept for inspection.
#[derive(Default)]
pub struct FakeWarehouse {
    prefixes: Arc<Mutex<HashMap<String, Vec<String>>>>,
    top: Arc<Mutex<Vec<String>>>,
    failing_prefixes: Arc<Mutex<Vec<String>>>,
    insert_errors: Arc<Mutex<Option<Vec<String>>>>,
    queries: Arc<Mutex<Vec<DomainQuery>>>,
    rows: Arc<Mutex<Vec<(String, Value)>>>,
    inserted: Arc<Notify>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer prefix queries for `prefix` with `domains`
    pub fn set_prefix(&self, prefix: &str, domains: &[&str]) {
        self.prefixes.lock().unwrap().insert(
            prefix.to_string(),
            domains.iter().map(|d| d.to_string()).collect(),
        );
    }

    /// Popularity-ordered domains served by top queries
    pub fn set_top(&self, domains: &[&str]) {
        *self.top.lock().unwrap() = domains.iter().map(|d| d.to_string()).collect();
    }

    /// Fail prefix queries for `prefix`
    pub fn fail_prefix(&self, prefix: &str) {
        self.failing_prefixes.lock().unwrap().push(prefix.to_string());
    }

    /// Reject every insert with `errors`
    pub fn fail_inserts(&self, errors: &[&str]) {
        *self.insert_errors.lock().unwrap() =
            Some(errors.iter().map(|e| e.to_string()).collect());
    }

    pub fn queries(&self) -> Vec<DomainQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn rows(&self) -> Vec<(String, Value)> {
        self.rows.lock().unwrap().clone()
    }

    /// Resolves after the next insert attempt, successful or not.
    pub async fn wait_for_insert(&self) {
        self.inserted.notified().await;
    }
}

#[async_trait]
impl Warehouse for FakeWarehouse {
    async fn query_domains(&self, query: &DomainQuery) -> Result<Vec<String>, AnalyticsError> {
        self.queries.lock().unwrap().push(query.clone());
        match query {
            DomainQuery::Prefix { prefix, limit } => {
                if self.failing_prefixes.lock().unwrap().contains(prefix) {
                    return Err(AnalyticsError::Status {
                        status: 503,
                        body: "unavailable".to_string(),
                    });
                }
                let prefixes = self.prefixes.lock().unwrap();
                Ok(prefixes
                    .get(prefix)
                    .map(|domains| domains.iter().take(*limit).cloned().collect())
                    .unwrap_or_default())
            }
            DomainQuery::Top { count } => {
                Ok(self.top.lock().unwrap().iter().take(*count).cloned().collect())
            }
        }
    }

    async fn insert_row(&self, table: &str, row: Value) -> Result<(), AnalyticsError> {
        let result = match self.insert_errors.lock().unwrap().clone() {
            Some(errors) => Err(AnalyticsError::Insert(errors)),
            None => {
                self.rows.lock().unwrap().push((table.to_string(), row));
                Ok(())
            }
        };
        self.inserted.notify_one();
        result
    }
}
