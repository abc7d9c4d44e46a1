//! End-to-end tests against a running inspector.

use std::fs;
use std::path::PathBuf;

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_status_and_banner() {
    let server = common::start_inspector().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "online");

    let body: Value = client
        .get(server.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["endpoints"].is_object());

    server.stop().await;
}

#[tokio::test]
async fn test_inspect_json_body() {
    let server = common::start_inspector().await;
    let client = reqwest::Client::new();

    let view: Value = client
        .post(server.url("/api/inspect?x=1&x=2"))
        .json(&json!({"a": 1, "b": [true, null]}))
        .header("Cookie", "session=abc; theme=dark")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(view["method"], "POST");
    assert_eq!(view["query_params"]["x"], "2");
    assert_eq!(view["body"]["json"], json!({"a": 1, "b": [true, null]}));
    assert_eq!(view["body"]["raw"], Value::Null);
    assert_eq!(view["body"]["form"], Value::Null);
    assert_eq!(view["cookies"]["theme"], "dark");
    assert_eq!(view["environment"]["is_json"], true);
    assert_eq!(view["environment"]["mimetype"], "application/json");
    assert_eq!(view["client"]["ip"], "127.0.0.1");
    assert_eq!(view["url"]["scheme"], "http");

    server.stop().await;
}

#[tokio::test]
async fn test_inspect_urlencoded_form() {
    let server = common::start_inspector().await;

    let view: Value = reqwest::Client::new()
        .put(server.url("/api/inspect"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("name=ada&lang=rust&name=grace")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(view["body"]["form"], json!({"name": "grace", "lang": "rust"}));
    assert_eq!(view["body"]["json"], Value::Null);
    assert_eq!(view["body"]["raw"], Value::Null);

    server.stop().await;
}

#[tokio::test]
async fn test_inspect_multipart_upload() {
    let server = common::start_inspector().await;

    let form = reqwest::multipart::Form::new()
        .text("title", "report")
        .part(
            "upload",
            reqwest::multipart::Part::bytes(b"hello".to_vec()).file_name("notes.txt"),
        );
    let view: Value = reqwest::Client::new()
        .post(server.url("/api/inspect"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(view["body"]["form"]["title"], "report");
    assert_eq!(view["body"]["files"]["upload"], "notes.txt");
    assert_eq!(view["environment"]["mimetype"], "multipart/form-data");
    assert!(view["environment"]["mimetype_params"]["boundary"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn test_echo_and_data() {
    let server = common::start_inspector().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(server.url("/api/echo?q=rust&page=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["query_params"], json!({"q": "rust", "page": "2"}));

    let res = client
        .post(server.url("/api/data"))
        .json(&json!({"k": "v"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["received"], json!({"k": "v"}));

    let res = client.get(server.url("/api/data")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    server.stop().await;
}

#[tokio::test]
async fn test_catch_all() {
    let server = common::start_inspector().await;

    let res = reqwest::Client::new()
        .delete(server.url("/anything/at/all"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "You reached: /anything/at/all");

    server.stop().await;
}

#[tokio::test]
async fn test_capture_writes_both_artifacts() {
    let server = common::start_inspector().await;

    let res = reqwest::Client::new()
        .post(server.url("/api/capture?id=7"))
        .header("Content-Type", "text/plain")
        .header("X-Trace", "one")
        .body("captured body")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();

    let raw_path = PathBuf::from(body["artifact"]["raw_path"].as_str().unwrap());
    let json_path = PathBuf::from(body["artifact"]["structured_path"].as_str().unwrap());
    assert!(raw_path.starts_with(server.capture_dir.path()));

    let raw = fs::read_to_string(&raw_path).unwrap();
    assert!(raw.starts_with("POST /api/capture?id=7 HTTP/1.1\n"));
    assert!(raw.contains("\nX-Trace: one\n"));
    assert!(raw.ends_with("\n\ncaptured body"));

    let structured: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(structured["body"]["raw"], "captured body");
    assert_eq!(structured["query_params"]["id"], "7");

    server.stop().await;
}

#[tokio::test]
async fn test_repeated_captures_never_collide() {
    let server = common::start_inspector().await;
    let client = reqwest::Client::new();

    let mut paths = Vec::new();
    for _ in 0..5 {
        let body: Value = client
            .get(server.url("/api/capture"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        paths.push(body["artifact"]["raw_path"].as_str().unwrap().to_string());
    }
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 5);

    let dir = server.capture_dir.path().join("captures");
    assert_eq!(fs::read_dir(dir).unwrap().count(), 10);

    server.stop().await;
}

#[tokio::test]
async fn test_capture_into_unwritable_directory_fails() {
    let server = common::start_inspector_with(|config| {
        // A regular file where the capture directory should be.
        let blocker = std::env::temp_dir().join(format!("inspector-blocker-{}", std::process::id()));
        fs::write(&blocker, b"not a directory").unwrap();
        config.capture.directory = blocker.join("captures");
    })
    .await;

    let res = reqwest::Client::new()
        .post(server.url("/api/capture"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());
    assert_eq!(body["written"], json!([]));
    let failed = body["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0]["artifact"], "raw");
    assert_eq!(failed[1]["artifact"], "structured");
    assert!(failed[0]["path"].as_str().unwrap().ends_with(".raw"));
    assert!(failed[1]["path"].as_str().unwrap().ends_with(".json"));

    server.stop().await;
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let server = common::start_inspector_with(|config| config.limits.max_body_bytes = 16).await;

    let res = reqwest::Client::new()
        .post(server.url("/api/inspect"))
        .body("x".repeat(64))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["limit_bytes"], 16);

    server.stop().await;
}
