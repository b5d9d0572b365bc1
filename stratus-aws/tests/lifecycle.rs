//! End-to-end lifecycle tests over the provider RPC surface.

mod common;

use std::time::Duration;

use serde_json::{Value, json};

use stratus_aws::iam::GROUP_TOKEN;
use stratus_aws::s3::BUCKET_TOKEN;

// =============================================================================
// System endpoints
// =============================================================================

#[tokio::test]
async fn test_version_and_registered_kinds() {
    let server = common::TestServer::spawn().await;

    let response = server.get("/version").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(!body["version"].as_str().unwrap().is_empty());

    let response = server.get("/providers").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kinds"], json!([GROUP_TOKEN, BUCKET_TOKEN]));

    server.shutdown();
}

// =============================================================================
// Check
// =============================================================================

#[tokio::test]
async fn test_check_reports_field_failures_and_gates_create() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post(
            "/provider/check",
            &json!({
                "type": BUCKET_TOKEN,
                "properties": {"name": "images", "bucketName": "ab"},
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let failures = body["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["field"], "bucketName");
    assert_eq!(failures[0]["reason"], "less than minimum length of 3");

    // the orchestrator stops on failures; the bucket must not exist
    let response = server
        .post(
            "/provider/get",
            &json!({"type": BUCKET_TOKEN, "id": "ab"}),
        )
        .await;
    assert_eq!(response.status(), 404);

    server.shutdown();
}

#[tokio::test]
async fn test_check_accepts_valid_payload() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post(
            "/provider/check",
            &json!({
                "type": BUCKET_TOKEN,
                "properties": {"name": "images", "bucketName": "images-prod"},
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["failures"], json!([]));

    server.shutdown();
}

#[tokio::test]
async fn test_check_rejects_malformed_payload() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post(
            "/provider/check",
            &json!({"type": BUCKET_TOKEN, "properties": ["not", "an", "object"]}),
        )
        .await;
    assert_eq!(response.status(), 400);

    server.shutdown();
}

// =============================================================================
// Name
// =============================================================================

#[tokio::test]
async fn test_name_resolution() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post(
            "/provider/name",
            &json!({"type": BUCKET_TOKEN, "properties": {"name": "images"}}),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "images");

    // empty name fails
    let response = server
        .post(
            "/provider/name",
            &json!({"type": BUCKET_TOKEN, "properties": {}}),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("cannot be empty"));

    // computed-unknown name fails distinctly
    let response = server
        .post(
            "/provider/name",
            &json!({
                "type": BUCKET_TOKEN,
                "properties": {},
                "unknowns": ["name"],
            }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("unknown outputs"));

    server.shutdown();
}

// =============================================================================
// Bucket lifecycle
// =============================================================================

#[tokio::test]
async fn test_bucket_lifecycle_with_propagation_delay() {
    let server = common::TestServer::spawn_with_delay(Duration::from_millis(40)).await;

    // Create without an explicit bucket name: id is synthesized.
    let response = server
        .post(
            "/provider/create",
            &json!({
                "type": BUCKET_TOKEN,
                "properties": {"name": "images", "accessControl": "private"},
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("images-"));
    assert!(id.len() <= 63);

    // Create returned only after convergence, so Get sees it immediately.
    let response = server
        .post("/provider/get", &json!({"type": BUCKET_TOKEN, "id": id}))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["properties"]["accessControl"], "private");

    // Renaming the bucket forces replacement; the acl does not.
    let response = server
        .post(
            "/provider/inspect-change",
            &json!({
                "type": BUCKET_TOKEN,
                "id": id,
                "olds": {"name": "images", "accessControl": "private"},
                "news": {"name": "images", "bucketName": "explicit", "accessControl": "public-read"},
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["replaces"], json!(["bucketName"]));

    // In-place acl update.
    let response = server
        .post(
            "/provider/update",
            &json!({
                "type": BUCKET_TOKEN,
                "id": id,
                "olds": {"name": "images", "accessControl": "private"},
                "news": {"name": "images", "accessControl": "public-read"},
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = server
        .post("/provider/get", &json!({"type": BUCKET_TOKEN, "id": id}))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["properties"]["accessControl"], "public-read");

    // A replace-class change handed to update is refused.
    let response = server
        .post(
            "/provider/update",
            &json!({
                "type": BUCKET_TOKEN,
                "id": id,
                "olds": {"name": "images"},
                "news": {"name": "renamed"},
            }),
        )
        .await;
    assert_eq!(response.status(), 500);

    // Delete blocks until the bucket is gone; a second delete is 404.
    let response = server
        .post("/provider/delete", &json!({"type": BUCKET_TOKEN, "id": id}))
        .await;
    assert_eq!(response.status(), 200);

    let response = server
        .post("/provider/delete", &json!({"type": BUCKET_TOKEN, "id": id}))
        .await;
    assert_eq!(response.status(), 404);

    server.shutdown();
}

#[tokio::test]
async fn test_bucket_create_with_explicit_name() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post(
            "/provider/create",
            &json!({
                "type": BUCKET_TOKEN,
                "properties": {"name": "images", "bucketName": "images-prod"},
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], "images-prod");

    // same explicit name again conflicts
    let response = server
        .post(
            "/provider/create",
            &json!({
                "type": BUCKET_TOKEN,
                "properties": {"name": "images", "bucketName": "images-prod"},
            }),
        )
        .await;
    assert_eq!(response.status(), 409);

    server.shutdown();
}

// =============================================================================
// Group lifecycle
// =============================================================================

#[tokio::test]
async fn test_group_lifecycle() {
    let server = common::TestServer::spawn_with_delay(Duration::from_millis(20)).await;

    let response = server
        .post(
            "/provider/create",
            &json!({
                "type": GROUP_TOKEN,
                "properties": {"name": "ops", "groupName": "ops-team", "path": "/teams/"},
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], "ops-team");

    let response = server
        .post(
            "/provider/update",
            &json!({
                "type": GROUP_TOKEN,
                "id": "ops-team",
                "olds": {"name": "ops", "groupName": "ops-team", "path": "/teams/"},
                "news": {"name": "ops", "groupName": "ops-team", "path": "/squads/"},
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = server
        .post("/provider/get", &json!({"type": GROUP_TOKEN, "id": "ops-team"}))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["properties"]["path"], "/squads/");

    let response = server
        .post("/provider/delete", &json!({"type": GROUP_TOKEN, "id": "ops-team"}))
        .await;
    assert_eq!(response.status(), 200);

    server.shutdown();
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn test_unknown_kind_is_an_internal_error() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post(
            "/provider/check",
            &json!({"type": "aws:ec2/instance:Instance", "properties": {}}),
        )
        .await;
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("no provider registered"));

    server.shutdown();
}
