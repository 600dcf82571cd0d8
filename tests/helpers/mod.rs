#![allow(dead_code)]
//! Shared fixtures for integration tests.

use domainlens::{
    analytics::{fake::FakeWarehouse, AnalyticsStore},
    certs::test_utils::FakeCertificateSource,
    config::{AnalyticsConfig, Config},
    services::Services,
};
use std::sync::Arc;

/// Collaborator fakes plus the services wired to them.
pub struct TestServices {
    pub certificates: Arc<FakeCertificateSource>,
    pub warehouse: Arc<FakeWarehouse>,
    pub services: Services,
}

/// Builds services against fakes, with analytics configured.
pub fn configured_services(config: Config) -> TestServices {
    let certificates = Arc::new(FakeCertificateSource::new());
    let warehouse = Arc::new(FakeWarehouse::new());
    let limit = config
        .analytics
        .as_ref()
        .map(|a| a.suggestion_limit)
        .unwrap_or(5);
    let store = AnalyticsStore::new(warehouse.clone(), limit);
    let services = Services::with_collaborators(&config, certificates.clone(), store);
    TestServices {
        certificates,
        warehouse,
        services,
    }
}

/// Builds services against fakes with the analytics store left unconfigured.
pub fn unconfigured_services(config: Config) -> TestServices {
    let certificates = Arc::new(FakeCertificateSource::new());
    let warehouse = Arc::new(FakeWarehouse::new());
    let services =
        Services::with_collaborators(&config, certificates.clone(), AnalyticsStore::Unconfigured);
    TestServices {
        certificates,
        warehouse,
        services,
    }
}

/// A config with an analytics section pointing nowhere in particular.
pub fn config_with_analytics() -> Config {
    Config {
        analytics: Some(AnalyticsConfig {
            project_id: "proj".to_string(),
            dataset: "stats".to_string(),
            ..AnalyticsConfig::default()
        }),
        ..Config::default()
    }
}
