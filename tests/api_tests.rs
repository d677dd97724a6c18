//! End-to-end tests for the generation endpoints.

use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

use phonegen_api::config::ServiceConfig;

mod common;

#[tokio::test]
async fn test_single_number_dashed() {
    let server = common::spawn_server(ServiceConfig::default()).await;
    let res = common::client()
        .get(server.url("/api/phone?format=dashed"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let request_id = res.headers()["x-request-id"].to_str().unwrap().to_string();
    let body: Value = res.json().await.unwrap();

    let formatted = body["data"]["formatted"].as_str().unwrap();
    assert!(Regex::new(r"^\d{3}-\d{3}-\d{4}$").unwrap().is_match(formatted));
    assert_eq!(body["data"]["format"], "dashed");
    assert_eq!(body["request_id"], request_id);
    assert_eq!(body["metadata"]["rate_limit_remaining"], 99);
}

#[tokio::test]
async fn test_single_number_defaults_to_plain() {
    let server = common::spawn_server(ServiceConfig::default()).await;
    let body: Value = common::client()
        .get(server.url("/api/phone"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let data = &body["data"];
    assert_eq!(data["format"], "plain");
    let raw = &data["raw"];
    let joined = format!(
        "{}{}{}",
        raw["areaCode"].as_str().unwrap(),
        raw["exchange"].as_str().unwrap(),
        raw["lineNumber"].as_str().unwrap()
    );
    assert_eq!(data["formatted"], joined);
    assert!(Regex::new(r"^\d{10}$").unwrap().is_match(&joined));
}

#[tokio::test]
async fn test_bulk_returns_requested_count() {
    let server = common::spawn_server(ServiceConfig::default()).await;
    let body: Value = common::client()
        .get(server.url("/api/phone/bulk?count=5&format=parentheses"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let numbers = body["data"].as_array().unwrap();
    assert_eq!(numbers.len(), 5);
    assert_eq!(body["metadata"]["count"], 5);
    let shape = Regex::new(r"^\(\d{3}\) \d{3}-\d{4}$").unwrap();
    for number in numbers {
        assert!(shape.is_match(number["formatted"].as_str().unwrap()));
    }
}

#[tokio::test]
async fn test_bulk_count_out_of_range() {
    let server = common::spawn_server(ServiceConfig::default()).await;
    let res = common::client()
        .get(server.url("/api/phone/bulk?count=2000"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Validation error");
    let message = body["details"][0]["message"].as_str().unwrap();
    assert!(message.contains('1') && message.contains("1000"));
    assert_eq!(body["details"][0]["field"], "count");
}

#[tokio::test]
async fn test_unknown_format_is_rejected() {
    let server = common::spawn_server(ServiceConfig::default()).await;
    let res = common::client()
        .get(server.url("/api/phone?format=roman"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["details"][0]["field"], "format");
    assert_eq!(body["details"][0]["value"], "roman");
}

#[tokio::test]
async fn test_formats_and_area_codes() {
    let server = common::spawn_server(ServiceConfig::default()).await;
    let client = common::client();

    let formats: Value = client
        .get(server.url("/api/formats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        formats["data"]["formats"],
        serde_json::json!(["plain", "dashed", "parentheses", "dotted"])
    );
    let dotted = formats["data"]["examples"]["dotted"].as_str().unwrap();
    assert!(Regex::new(r"^\d{3}\.\d{3}\.\d{4}$").unwrap().is_match(dotted));

    let codes: Value = client
        .get(server.url("/api/area-codes"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(codes["data"]["count"], 72);
    assert!(codes["data"]["area_codes"]
        .as_array()
        .unwrap()
        .contains(&Value::from("212")));
}

#[tokio::test]
async fn test_unknown_route() {
    let server = common::spawn_server(ServiceConfig::default()).await;
    let res = common::client()
        .get(server.url("/api/nothing-here"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let request_id = res.headers()["x-request-id"].to_str().unwrap().to_string();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Route not found");
    assert_eq!(body["request_id"], request_id);
}

#[tokio::test]
async fn test_security_headers_present() {
    let server = common::spawn_server(ServiceConfig::default()).await;
    let res = common::client()
        .get(server.url("/api/phone"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    assert_eq!(res.headers()["referrer-policy"], "no-referrer");
}
