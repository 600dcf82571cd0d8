//! End-to-end tests for the `domainlens` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NO_CONFIG: &str = "/nonexistent/domainlens.toml";

fn domainlens() -> Command {
    let mut cmd = Command::cargo_bin("domainlens").unwrap();
    cmd.env("RUST_LOG", "error").args(["--config", NO_CONFIG]);
    cmd
}

fn crtsh_entry(id: u64, common_name: &str, entry_timestamp: &str) -> Value {
    json!({
        "issuer_ca_id": 1,
        "issuer_name": "C=US, O=Let's Encrypt, CN=R3",
        "common_name": common_name,
        "name_value": common_name,
        "id": id,
        "entry_timestamp": entry_timestamp,
        "not_before": "2024-01-01T00:00:00",
        "not_after": "2024-04-01T00:00:00"
    })
}

#[test]
fn test_help_lists_subcommands() {
    domainlens()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("certs"))
        .stdout(predicate::str::contains("suggest"))
        .stdout(predicate::str::contains("serve"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_certs_prints_merged_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "www.example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([crtsh_entry(1, "www.example.com", "2023-06-01T00:00:00")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("q", "*.example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([crtsh_entry(2, "*.example.com", "2024-06-01T00:00:00")])),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        domainlens()
            .args(["--crtsh-url", &uri, "--json", "certs", "www.example.com"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    })
    .await
    .unwrap();

    let body: Value = serde_json::from_slice(&output).unwrap();
    let ids: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_certs_plain_text_empty_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        domainlens()
            .args(["--crtsh-url", &uri, "certs", "example.com"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No issued certificates found!"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_certs_upstream_failure_exits_non_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        domainlens()
            .args(["--crtsh-url", &uri, "certs", "www.example.com"])
            .assert()
            .failure()
            .code(1);
    })
    .await
    .unwrap();
}

#[test]
fn test_suggest_without_analytics_finds_nothing() {
    domainlens()
        .args(["suggest", "www.examp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No domains found."));
}
