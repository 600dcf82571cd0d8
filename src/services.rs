//! Encapsulation for setting up external services.

use crate::{
    analytics::{AnalyticsStore, BigQueryClient},
    certs::{CertificateAggregator, CrtShClient},
    config::Config,
    core::{CertificateSource, SuggestionSource},
    recorder::LookupRecorder,
    suggest::SuggestionEngine,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// The lookup services, wired to their collaborators.
pub struct Services {
    pub certificates: CertificateAggregator,
    pub suggestions: SuggestionEngine,
    pub recorder: LookupRecorder,
}

impl Services {
    /// Builds the services against the real crt.sh and warehouse clients
    /// described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let certificate_source = Arc::new(
            CrtShClient::from_config(&config.certificates)
                .context("failed to build the certificate search client")?,
        );
        let store = analytics_store(config)?;
        Ok(Self::with_collaborators(config, certificate_source, store))
    }

    /// Builds the services around already constructed collaborators.
    pub fn with_collaborators(
        config: &Config,
        certificate_source: Arc<dyn CertificateSource>,
        store: AnalyticsStore,
    ) -> Self {
        let lookups_table = config
            .analytics
            .as_ref()
            .map(|analytics| analytics.lookups_table.clone())
            .unwrap_or_else(|| "lookups".to_string());
        let suggestion_source: Arc<dyn SuggestionSource> = Arc::new(store.clone());

        Self {
            certificates: CertificateAggregator::new(
                certificate_source,
                config.certificates.failure_policy,
            ),
            suggestions: SuggestionEngine::new(suggestion_source),
            recorder: LookupRecorder::new(store, lookups_table),
        }
    }
}

/// Resolves the analytics capability once: configured warehouse or null store.
pub fn analytics_store(config: &Config) -> Result<AnalyticsStore> {
    match &config.analytics {
        Some(analytics) => {
            info!(
                project = %analytics.project_id,
                dataset = %analytics.dataset,
                "Analytics warehouse enabled."
            );
            let client = BigQueryClient::from_config(analytics)
                .context("failed to build the analytics warehouse client")?;
            Ok(AnalyticsStore::new(
                Arc::new(client),
                analytics.suggestion_limit,
            ))
        }
        None => {
            info!("No analytics warehouse configured, lookups will not be recorded.");
            Ok(AnalyticsStore::Unconfigured)
        }
    }
}
