//! tests/user_api/token.rs
//! POST /api/user/token/

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

async fn request_token(app: &common::TestApp, payload: Value) -> reqwest::Response {
    app.client
        .post(app.url("/api/user/token/"))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request.")
}

#[tokio::test]
async fn create_token_for_user() {
    let app: common::TestApp = common::spawn_app();
    app.create_user("test@example.com", "test-user-password123").await;

    let resp: reqwest::Response = request_token(
        &app,
        json!({ "email": "test@example.com", "password": "test-user-password123" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = resp.json().await.unwrap();
    let token: &str = json["data"]["token"].as_str().unwrap();
    assert_eq!(token.len(), 40);
}

#[tokio::test]
async fn token_is_reused_across_logins() {
    let app: common::TestApp = common::spawn_app();
    app.create_user("test@example.com", "goodpass").await;

    let first: String = app.token_for("test@example.com", "goodpass").await;
    let second: String = app.token_for("test@example.com", "goodpass").await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn create_token_bad_credentials() {
    let app: common::TestApp = common::spawn_app();
    app.create_user("test@example.com", "goodpass").await;

    let resp: reqwest::Response = request_token(
        &app,
        json!({ "email": "test@example.com", "password": "badpass" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = resp.json().await.unwrap();
    assert!(json["data"].get("token").is_none());
    assert_eq!(
        json["data"]["non_field_errors"][0],
        "Unable to authenticate with provided credentials."
    );
}

#[tokio::test]
async fn create_token_unknown_user() {
    let app: common::TestApp = common::spawn_app();

    let resp: reqwest::Response = request_token(
        &app,
        json!({ "email": "nobody@example.com", "password": "whatever" }),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_token_blank_password() {
    let app: common::TestApp = common::spawn_app();
    app.create_user("test@example.com", "goodpass").await;

    let resp: reqwest::Response = request_token(
        &app,
        json!({ "email": "test@example.com", "password": "" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = resp.json().await.unwrap();
    assert!(json["data"].get("token").is_none());
    assert!(json["data"]["password"].is_array());
}
