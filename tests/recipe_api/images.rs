//! tests/recipe_api/images.rs
//! POST /api/recipe/recipes/{id}/upload-image/

#[path = "../mod.rs"]
mod common;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// A minimal but well-formed 1x1 PNG
const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

fn upload_url(recipe: &Value) -> String {
    format!("/api/recipe/recipes/{}/upload-image/", recipe["id"])
}

fn image_form(bytes: &[u8], filename: &str) -> Form {
    Form::new().part("image", Part::bytes(bytes.to_vec()).file_name(filename.to_owned()))
}

async fn upload(app: &common::TestApp, token: &str, recipe: &Value, form: Form) -> reqwest::Response {
    app.post(token, &upload_url(recipe))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.")
}

/// Maps `/static/media/<path>` back onto the temporary media root
fn stored_path(app: &common::TestApp, url: &str) -> std::path::PathBuf {
    let relative: &str = url.strip_prefix("/static/media/").expect("media url");
    app.media_root.path().join(relative)
}

#[tokio::test]
async fn upload_image() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    let resp: reqwest::Response = upload(&app, &token, &recipe, image_form(PNG_BYTES, "photo.png")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["data"]["id"], recipe["id"]);
    let url: &str = json["data"]["image"].as_str().unwrap();
    assert!(url.starts_with("/static/media/uploads/recipe/"));
    assert!(url.ends_with(".png"));
    assert!(stored_path(&app, url).exists());

    // The stored file is served raw, outside the JSON envelope
    let served: reqwest::Response = app.client.get(app.url(url)).send().await.unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.bytes().await.unwrap().as_ref(), PNG_BYTES);
}

#[tokio::test]
async fn upload_image_bad_request() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    let resp: reqwest::Response = upload(&app, &token, &recipe, image_form(b"notanimage", "notanimage.png")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = resp.json().await.unwrap();
    assert!(json["data"]["image"].is_array());
}

#[tokio::test]
async fn upload_without_image_field() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    let form: Form = Form::new().text("caption", "no file here");
    let resp: reqwest::Response = upload(&app, &token, &recipe, form).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["data"]["image"][0], "No file was submitted.");
}

#[tokio::test]
async fn replacing_an_image_removes_the_old_file() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    let first: Value = upload(&app, &token, &recipe, image_form(PNG_BYTES, "first.png")).await.json().await.unwrap();
    let second: Value = upload(&app, &token, &recipe, image_form(PNG_BYTES, "second")).await.json().await.unwrap();

    let first_url: &str = first["data"]["image"].as_str().unwrap();
    let second_url: &str = second["data"]["image"].as_str().unwrap();
    assert_ne!(first_url, second_url);
    assert!(!stored_path(&app, first_url).exists());
    assert!(second_url.ends_with(".png"));
    assert!(stored_path(&app, second_url).exists());
}

#[tokio::test]
async fn upload_name_extension_is_ignored() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    let mut bytes: Vec<u8> = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(b"<script>alert(document.cookie)</script>");
    let long_name: String = format!("x.{}", "h".repeat(300));

    for filename in ["evil.html", long_name.as_str()] {
        let resp: reqwest::Response = upload(&app, &token, &recipe, image_form(&bytes, filename)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json: Value = resp.json().await.unwrap();
        let url: &str = json["data"]["image"].as_str().unwrap();
        assert!(url.ends_with(".png"), "{url}");

        let served: reqwest::Response = app.client.get(app.url(url)).send().await.unwrap();
        let content_type: String = served.headers()["content-type"].to_str().unwrap().to_owned();
        assert_eq!(content_type, "image/png");
    }
}

#[tokio::test]
async fn deleting_a_recipe_removes_its_image() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    let uploaded: Value = upload(&app, &token, &recipe, image_form(PNG_BYTES, "photo.png")).await.json().await.unwrap();
    let url: &str = uploaded["data"]["image"].as_str().unwrap();

    let resp: reqwest::Response = app
        .delete(&token, &format!("/api/recipe/recipes/{}/", recipe["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(!stored_path(&app, url).exists());
}

#[tokio::test]
async fn upload_to_other_users_recipe_is_not_found() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let other: String = app.authenticated_user("other@example.com").await;
    let recipe: Value = app.create_recipe(&other, json!({})).await;

    let resp: reqwest::Response = upload(&app, &token, &recipe, image_form(PNG_BYTES, "photo.png")).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
