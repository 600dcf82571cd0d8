//! Domain autocomplete with one level of label-stripping fallback.
//!
//! A user typing `www.examp` rarely matches anything directly, but `examp`
//! usually does. When the full query finds nothing, the leftmost label is
//! stripped, the remainder is searched, and the stripped label is put back in
//! front of every hit (`www.` + `example.com`).

use crate::analytics::AnalyticsError;
use crate::core::SuggestionSource;
use crate::domain;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct SuggestionEngine {
    source: Arc<dyn SuggestionSource>,
}

impl SuggestionEngine {
    pub fn new(source: Arc<dyn SuggestionSource>) -> Self {
        Self { source }
    }

    /// Suggests completions for a partially typed domain.
    ///
    /// Results keep the source's order. Source failures propagate; there is no
    /// fallback on error.
    #[instrument(skip(self))]
    pub async fn suggest(&self, query: &str) -> Result<Vec<String>, AnalyticsError> {
        let primary = self.source.prefix_search(query).await?;
        if !primary.is_empty() {
            return Ok(primary);
        }

        let labels = domain::labels(query);
        let Some((first, rest)) = labels.split_first() else {
            return Ok(Vec::new());
        };
        if rest.is_empty() {
            return Ok(Vec::new());
        }

        let remainder = rest.join(".");
        debug!(remainder = %remainder, "No direct suggestions, retrying without first label");
        metrics::counter!("suggestion_fallbacks_total").increment(1);

        let secondary = self.source.prefix_search(&remainder).await?;
        Ok(secondary
            .into_iter()
            .map(|suggestion| format!("{}.{}", first, suggestion))
            .collect())
    }

    /// The `count` most looked-up domains.
    pub async fn top_domains(&self, count: usize) -> Result<Vec<String>, AnalyticsError> {
        self.source.top_domains(count).await
    }
}
