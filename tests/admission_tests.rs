//! End-to-end tests for authentication, rate limiting and shutdown.

use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashSet;

mod common;

#[tokio::test]
async fn test_open_mode_without_keys() {
    let server = common::spawn_server(common::config_with(&[], 100)).await;
    let client = common::client();

    let res = client.get(server.url("/api/phone")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(server.url("/api/phone"))
        .header("X-API-Key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_or_wrong_key_is_unauthorized() {
    let server = common::spawn_server(common::config_with(&["k1", "k2"], 100)).await;
    let client = common::client();

    let res = client.get(server.url("/api/phone")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid or missing API key");

    let res = client
        .get(server.url("/api/phone"))
        .header("X-API-Key", "k3")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(!res.text().await.unwrap().contains("k3"));

    let res = client
        .get(server.url("/api/phone"))
        .header("X-API-Key", "k2")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_exceeded_after_quota() {
    let server = common::spawn_server(common::config_with(&[], 3)).await;
    let client = common::client();

    for expected_remaining in (0..3).rev() {
        let res = client.get(server.url("/api/phone")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()["ratelimit-remaining"].to_str().unwrap(),
            expected_remaining.to_string()
        );
    }

    let res = client.get(server.url("/api/phone")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key("retry-after"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Too many requests, please try again later");
    assert_eq!(body["details"]["rate_limit_remaining"], 0);
    assert!(body["details"]["rate_limit_reset"].is_string());
}

#[tokio::test]
async fn test_auth_runs_before_rate_limit() {
    let server = common::spawn_server(common::config_with(&["secret"], 1)).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client.get(server.url("/api/phone")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    // Rejected requests never reached the counter
    let res = client
        .get(server.url("/api/phone"))
        .header("X-API-Key", "secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_skips_admission() {
    let server = common::spawn_server(common::config_with(&["secret"], 1)).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let request_id = res.headers()["x-request-id"].to_str().unwrap().to_string();
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["request_id"], request_id);
    }
}

#[tokio::test]
async fn test_health_gated_when_not_exempt() {
    let mut config = common::config_with(&["secret"], 100);
    config.admission.exempt_paths.clear();
    let server = common::spawn_server(config).await;

    let res = common::client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let server = common::spawn_server(common::config_with(&[], 100)).await;
    let client = common::client();

    let mut seen = HashSet::new();
    for _ in 0..20 {
        let res = client.get(server.url("/health")).send().await.unwrap();
        let id = res.headers()["x-request-id"].to_str().unwrap().to_string();
        assert!(seen.insert(id));
    }
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let server = common::spawn_server(common::config_with(&[], 100)).await;
    let url = server.url("/health");

    let status = common::client().get(&url).send().await.unwrap().status();
    assert_eq!(status, StatusCode::OK);

    server.stop().await.unwrap();
    assert!(common::client().get(&url).send().await.is_err());
}
