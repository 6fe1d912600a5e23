//! tests/global_errors/405.rs
//! Known routes answer unsupported methods with 405.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn returns_405_for_unsupported_method() {
    let app: common::TestApp = common::spawn_app();

    let resp: reqwest::Response = app.client
        .get(app.url("/api/user/create/"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "METHOD_NOT_ALLOWED");
    assert_eq!(json["code"], 405);
}

#[tokio::test]
async fn post_me_not_allowed() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let resp: reqwest::Response = app.post(&token, "/api/user/me/").json(&serde_json::json!({})).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
