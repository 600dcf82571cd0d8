//! Fire-and-forget lookup logging.

use crate::analytics::{AnalyticsError, AnalyticsStore};
use crate::core::{LookupEvent, LookupRequest};
use crate::domain;
use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;
use tokio::task::JoinHandle;
use tracing::{debug, error};

static BOT_USER_AGENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bot|crawl|spider|slurp|scrape|headless|preview|facebookexternalhit|python-requests|curl/|wget/")
        .expect("bot user-agent pattern is valid")
});

/// Heuristic crawler detection from a `User-Agent` header.
pub fn is_bot_user_agent(user_agent: Option<&str>) -> bool {
    user_agent.is_some_and(|ua| BOT_USER_AGENT.is_match(ua))
}

impl LookupEvent {
    /// Stamps a request with its base domain and the current unix time.
    pub fn from_request(request: LookupRequest) -> Self {
        Self {
            base_domain: domain::base_domain(&request.domain),
            timestamp: Utc::now().timestamp(),
            domain: request.domain,
            ip: request.ip,
            user_agent: request.user_agent,
            is_bot: request.is_bot,
        }
    }
}

/// Writes one row per lookup to the analytics store without blocking callers.
#[derive(Debug, Clone)]
pub struct LookupRecorder {
    store: AnalyticsStore,
    table: String,
}

impl LookupRecorder {
    pub fn new(store: AnalyticsStore, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Records a lookup in the background.
    ///
    /// Returns `None` without spawning anything when analytics is unconfigured.
    /// Otherwise the returned handle resolves once the write has finished;
    /// request paths drop it.
    pub fn record(&self, request: LookupRequest) -> Option<JoinHandle<()>> {
        if !self.store.is_configured() {
            return None;
        }
        let event = LookupEvent::from_request(request);
        let recorder = self.clone();
        Some(tokio::spawn(async move { recorder.write(event).await }))
    }

    /// Writes an event, logging and swallowing any failure.
    pub async fn write(&self, event: LookupEvent) {
        let row = match serde_json::to_value(&event) {
            Ok(row) => row,
            Err(e) => {
                error!(error = %e, domain = %event.domain, "Failed to serialize lookup event");
                return;
            }
        };

        match self.store.insert_row(&self.table, row).await {
            Ok(()) => {
                metrics::counter!("lookups_recorded_total", "status" => "success").increment(1);
                debug!(domain = %event.domain, "Recorded lookup");
            }
            Err(AnalyticsError::Insert(errors)) => {
                metrics::counter!("lookups_recorded_total", "status" => "failure").increment(1);
                for e in errors {
                    error!(domain = %event.domain, error = %e, "Failed to record lookup");
                }
            }
            Err(e) => {
                metrics::counter!("lookups_recorded_total", "status" => "failure").increment(1);
                error!(domain = %event.domain, error = %e, "Failed to record lookup");
            }
        }
    }
}
