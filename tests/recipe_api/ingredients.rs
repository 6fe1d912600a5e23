//! tests/recipe_api/ingredients.rs
//! /api/recipe/ingredients/

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

const INGREDIENTS_URL: &str = "/api/recipe/ingredients/";

#[tokio::test]
async fn login_required() {
    let app: common::TestApp = common::spawn_app();

    let resp: reqwest::Response = app.client.get(app.url(INGREDIENTS_URL)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ingredient_list_limited_to_user() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let other: String = app.authenticated_user("other@example.com").await;
    app.post(&other, INGREDIENTS_URL).json(&json!({ "name": "Vinegar" })).send().await.unwrap();
    app.post(&token, INGREDIENTS_URL).json(&json!({ "name": "Tumeric" })).send().await.unwrap();

    let json: Value = app.get(&token, INGREDIENTS_URL).send().await.unwrap().json().await.unwrap();

    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["name"], "Tumeric");
}

#[tokio::test]
async fn create_ingredient_successful() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let resp: reqwest::Response = app
        .post(&token, INGREDIENTS_URL)
        .json(&json!({ "name": "Cabbage" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let ids: Vec<i64> = app.list_ids(&token, INGREDIENTS_URL).await;
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn create_ingredient_invalid() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let resp: reqwest::Response = app.post(&token, INGREDIENTS_URL).json(&json!({ "name": "" })).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["data"]["name"][0], "This field may not be blank.");
}

#[tokio::test]
async fn retrieve_ingredients_assigned_to_recipes() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    app.post(&token, INGREDIENTS_URL).json(&json!({ "name": "Turkey" })).send().await.unwrap();
    app.create_recipe(&token, json!({ "ingredients": [{ "name": "Apples" }] })).await;

    let json: Value = app
        .get(&token, "/api/recipe/ingredients/?assigned_only=1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["name"], "Apples");

    // Zero disables the restriction
    let all: Vec<i64> = app.list_ids(&token, "/api/recipe/ingredients/?assigned_only=0").await;
    assert_eq!(all.len(), 2);
}
