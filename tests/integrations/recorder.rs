//! Integration tests for lookup recording.

#[path = "../helpers/mod.rs"]
mod helpers;

use domainlens::analytics::{fake::FakeWarehouse, AnalyticsStore};
use domainlens::core::{LookupEvent, LookupRequest};
use domainlens::recorder::LookupRecorder;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn request(domain: &str) -> LookupRequest {
    LookupRequest {
        domain: domain.to_string(),
        ip: "198.51.100.4".to_string(),
        user_agent: Some("Mozilla/5.0".to_string()),
        is_bot: false,
    }
}

#[tokio::test]
async fn test_record_writes_one_row_to_lookups_table() {
    let warehouse = Arc::new(FakeWarehouse::new());
    let recorder = LookupRecorder::new(AnalyticsStore::new(warehouse.clone(), 5), "lookups");

    let handle = recorder
        .record(request("www.example.com"))
        .expect("configured store spawns a write");
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("write finished")
        .expect("write task did not panic");

    let rows = warehouse.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "lookups");
    let event: LookupEvent = serde_json::from_value(rows[0].1.clone()).unwrap();
    assert_eq!(event.domain, "www.example.com");
    assert_eq!(event.base_domain, "example.com");
    assert_eq!(event.ip, "198.51.100.4");
    assert!(event.timestamp > 0);
}

#[tokio::test]
async fn test_record_swallows_insert_errors() {
    let warehouse = Arc::new(FakeWarehouse::new());
    warehouse.fail_inserts(&["no such field: foo", "quota exceeded"]);
    let recorder = LookupRecorder::new(AnalyticsStore::new(warehouse.clone(), 5), "lookups");

    let handle = recorder.record(request("example.com")).unwrap();

    // The task completes normally; the failure never reaches the caller.
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("write finished")
        .expect("write task did not panic");
    assert!(warehouse.rows().is_empty());
}

#[tokio::test]
async fn test_record_does_not_block_caller() {
    let warehouse = Arc::new(FakeWarehouse::new());
    let recorder = LookupRecorder::new(AnalyticsStore::new(warehouse.clone(), 5), "lookups");

    // Dropping the handle leaves the write running.
    drop(recorder.record(request("example.com")));

    timeout(Duration::from_secs(5), warehouse.wait_for_insert())
        .await
        .expect("background write happened");
    assert_eq!(warehouse.rows().len(), 1);
}

#[tokio::test]
async fn test_record_with_unconfigured_store_is_a_no_op() {
    let test = helpers::unconfigured_services(domainlens::config::Config::default());

    assert!(test.services.recorder.record(request("example.com")).is_none());
    assert!(test.warehouse.rows().is_empty());
}

#[tokio::test]
async fn test_recorder_uses_configured_table() {
    let mut config = helpers::config_with_analytics();
    if let Some(analytics) = config.analytics.as_mut() {
        analytics.lookups_table = "lookups_v2".to_string();
    }
    let test = helpers::configured_services(config);

    let handle = test.services.recorder.record(request("example.com")).unwrap();
    handle.await.unwrap();

    assert_eq!(test.warehouse.rows()[0].0, "lookups_v2");
}
