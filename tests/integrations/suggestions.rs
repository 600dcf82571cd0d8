//! Integration tests for suggestions served from the analytics store.

#[path = "../helpers/mod.rs"]
mod helpers;

use domainlens::analytics::DomainQuery;
use domainlens::config::Config;
use helpers::{config_with_analytics, configured_services, unconfigured_services};

#[tokio::test]
async fn test_direct_hits_are_returned_unchanged() {
    let test = configured_services(config_with_analytics());
    test.warehouse
        .set_prefix("examp", &["example.com", "example.net"]);

    let suggestions = test.services.suggestions.suggest("examp").await.unwrap();

    assert_eq!(suggestions, vec!["example.com", "example.net"]);
    assert_eq!(test.warehouse.queries().len(), 1);
}

#[tokio::test]
async fn test_subdomain_prefix_falls_back_to_base_domain() {
    let test = configured_services(config_with_analytics());
    test.warehouse.set_prefix("examp", &["example.com"]);

    let suggestions = test
        .services
        .suggestions
        .suggest("www.examp")
        .await
        .unwrap();

    assert_eq!(suggestions, vec!["www.example.com"]);
    assert_eq!(
        test.warehouse.queries(),
        vec![
            DomainQuery::Prefix {
                prefix: "www.examp".to_string(),
                limit: 5
            },
            DomainQuery::Prefix {
                prefix: "examp".to_string(),
                limit: 5
            },
        ]
    );
}

#[tokio::test]
async fn test_queries_are_lowercased_but_stripped_label_is_kept() {
    let test = configured_services(config_with_analytics());
    test.warehouse.set_prefix("examp", &["example.com"]);

    let suggestions = test
        .services
        .suggestions
        .suggest("WWW.Examp")
        .await
        .unwrap();

    assert_eq!(suggestions, vec!["WWW.example.com"]);
}

#[tokio::test]
async fn test_single_label_without_hits_is_empty() {
    let test = configured_services(config_with_analytics());
    test.warehouse.set_prefix("", &["example.com"]);

    let suggestions = test.services.suggestions.suggest("a").await.unwrap();

    assert!(suggestions.is_empty());
    assert_eq!(test.warehouse.queries().len(), 1);
}

#[tokio::test]
async fn test_suggestion_limit_comes_from_config() {
    let mut config = config_with_analytics();
    if let Some(analytics) = config.analytics.as_mut() {
        analytics.suggestion_limit = 2;
    }
    let test = configured_services(config);
    test.warehouse
        .set_prefix("ex", &["example.com", "example.net", "example.org"]);

    let suggestions = test.services.suggestions.suggest("ex").await.unwrap();

    assert_eq!(suggestions, vec!["example.com", "example.net"]);
}

#[tokio::test]
async fn test_warehouse_failure_fails_request() {
    let test = configured_services(config_with_analytics());
    test.warehouse.fail_prefix("examp");

    let result = test.services.suggestions.suggest("www.examp").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_top_domains() {
    let test = configured_services(config_with_analytics());
    test.warehouse
        .set_top(&["google.com", "example.com", "github.com"]);

    let domains = test.services.suggestions.top_domains(2).await.unwrap();

    assert_eq!(domains, vec!["google.com", "example.com"]);
}

#[tokio::test]
async fn test_unconfigured_store_suggests_nothing() {
    let test = unconfigured_services(Config::default());
    test.warehouse.set_prefix("examp", &["example.com"]);

    assert!(test
        .services
        .suggestions
        .suggest("www.examp")
        .await
        .unwrap()
        .is_empty());
    assert!(test
        .services
        .suggestions
        .top_domains(10)
        .await
        .unwrap()
        .is_empty());
    assert!(test.warehouse.queries().is_empty());
}
