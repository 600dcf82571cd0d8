//! A BigQuery REST (v2) warehouse client.
//!
//! Reads go through the synchronous `queries` endpoint with standard SQL and
//! named parameters; writes go through `tables.insertAll` streaming inserts.

use crate::analytics::{AnalyticsError, DomainQuery, Warehouse};
use crate::config::AnalyticsConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

/// Talks to a BigQuery-compatible REST endpoint.
pub struct BigQueryClient {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    dataset: String,
    popular_domains_table: String,
    access_token: Option<String>,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    /// `false` when the job outlived `timeoutMs`; `rows` is then absent.
    #[serde(default)]
    job_complete: Option<bool>,
    #[serde(default)]
    rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    v: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertAllResponse {
    #[serde(default)]
    insert_errors: Vec<InsertError>,
}

#[derive(Debug, Deserialize)]
struct InsertError {
    index: u64,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

impl BigQueryClient {
    pub fn from_config(config: &AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            dataset: config.dataset.clone(),
            popular_domains_table: config.popular_domains_table.clone(),
            access_token: config.access_token.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    /// The statement and named parameters for a popularity query.
    fn statement(&self, query: &DomainQuery) -> (String, Vec<Value>) {
        let table = format!(
            "`{}.{}.{}`",
            self.project_id, self.dataset, self.popular_domains_table
        );
        match query {
            DomainQuery::Prefix { prefix, limit } => (
                format!(
                    "SELECT domain FROM {table} WHERE STARTS_WITH(domain, @prefix) ORDER BY count DESC LIMIT {limit}"
                ),
                vec![json!({
                    "name": "prefix",
                    "parameterType": { "type": "STRING" },
                    "parameterValue": { "value": prefix },
                })],
            ),
            DomainQuery::Top { count } => (
                format!(
                    "SELECT domain FROM {table} WHERE domain IS NOT NULL ORDER BY count DESC LIMIT {count}"
                ),
                Vec::new(),
            ),
        }
    }

    async fn post(&self, url: String, body: &Value) -> Result<Value, AnalyticsError> {
        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyticsError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| AnalyticsError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    #[instrument(skip(self))]
    async fn query_domains(&self, query: &DomainQuery) -> Result<Vec<String>, AnalyticsError> {
        let (sql, parameters) = self.statement(query);
        let mut body = json!({
            "query": sql,
            "useLegacySql": false,
            "timeoutMs": self.timeout_ms,
        });
        if !parameters.is_empty() {
            body["parameterMode"] = json!("NAMED");
            body["queryParameters"] = Value::Array(parameters);
        }

        let url = format!("{}/projects/{}/queries", self.endpoint, self.project_id);
        let response: QueryResponse = serde_json::from_value(self.post(url, &body).await?)
            .map_err(|e| AnalyticsError::Decode(e.to_string()))?;
        if response.job_complete == Some(false) {
            return Err(AnalyticsError::Incomplete);
        }

        let domains: Vec<String> = response
            .rows
            .into_iter()
            .filter_map(|row| row.f.into_iter().next())
            .filter_map(|cell| cell.v.as_str().map(str::to_string))
            .collect();
        debug!(count = domains.len(), "Warehouse returned domains");
        Ok(domains)
    }

    #[instrument(skip(self, row))]
    async fn insert_row(&self, table: &str, row: Value) -> Result<(), AnalyticsError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}/insertAll",
            self.endpoint, self.project_id, self.dataset, table
        );
        let body = json!({ "rows": [{ "json": row }] });
        let response: InsertAllResponse = serde_json::from_value(self.post(url, &body).await?)
            .map_err(|e| AnalyticsError::Decode(e.to_string()))?;

        if response.insert_errors.is_empty() {
            return Ok(());
        }
        let messages = response
            .insert_errors
            .into_iter()
            .flat_map(|insert_error| {
                let index = insert_error.index;
                insert_error
                    .errors
                    .into_iter()
                    .map(move |e| format!("row {}: {} ({})", index, e.message, e.reason))
            })
            .collect();
        Err(AnalyticsError::Insert(messages))
    }
}
