//! tests/recipe_api/recipes.rs
//! CRUD on /api/recipe/recipes/

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

const RECIPES_URL: &str = "/api/recipe/recipes/";

fn detail_url(id: &Value) -> String {
    format!("/api/recipe/recipes/{}/", id)
}

fn names(items: &Value) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item: &Value| item["name"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn retrieve_recipes_newest_first() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let first: Value = app.create_recipe(&token, json!({})).await;
    let second: Value = app.create_recipe(&token, json!({ "title": "Second" })).await;

    let ids: Vec<i64> = app.list_ids(&token, RECIPES_URL).await;
    assert_eq!(ids, vec![second["id"].as_i64().unwrap(), first["id"].as_i64().unwrap()]);
}

#[tokio::test]
async fn list_uses_the_summary_shape() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    app.create_recipe(&token, json!({})).await;

    let json: Value = app.get(&token, RECIPES_URL).send().await.unwrap().json().await.unwrap();
    let item: &Value = &json["data"][0];

    assert_eq!(item["title"], "Sample recipe title");
    assert_eq!(item["time_minutes"], 22);
    assert_eq!(item["price"], "5.25");
    assert_eq!(item["link"], "http://example.com/recipe.pdf");
    assert!(item["tags"].is_array());
    assert!(item["ingredients"].is_array());
    assert!(item.get("description").is_none());
}

#[tokio::test]
async fn recipe_list_limited_to_user() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let other: String = app.authenticated_user("other@example.com").await;

    app.create_recipe(&other, json!({})).await;
    let own: Value = app.create_recipe(&token, json!({})).await;

    let ids: Vec<i64> = app.list_ids(&token, RECIPES_URL).await;
    assert_eq!(ids, vec![own["id"].as_i64().unwrap()]);
}

#[tokio::test]
async fn get_recipe_detail() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    let resp: reqwest::Response = app.get(&token, &detail_url(&recipe["id"])).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["data"], recipe);
    assert_eq!(json["data"]["description"], "Sample description");
}

#[tokio::test]
async fn other_users_recipe_is_not_found() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let other: String = app.authenticated_user("other@example.com").await;
    let recipe: Value = app.create_recipe(&other, json!({})).await;

    let resp: reqwest::Response = app.get(&token, &detail_url(&recipe["id"])).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp: reqwest::Response = app.get(&token, "/api/recipe/recipes/abc/").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_recipe() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let resp: reqwest::Response = app
        .post(&token, RECIPES_URL)
        .json(&json!({ "title": "Sample recipe", "time_minutes": 30, "price": 5.99 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["data"]["title"], "Sample recipe");
    assert_eq!(json["data"]["time_minutes"], 30);
    assert_eq!(json["data"]["price"], "5.99");
    assert_eq!(json["data"]["link"], "");
    assert_eq!(json["data"]["description"], "");
}

#[tokio::test]
async fn create_recipe_requires_core_fields() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let resp: reqwest::Response = app
        .post(&token, RECIPES_URL)
        .json(&json!({ "link": "http://example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = resp.json().await.unwrap();
    for field in ["title", "time_minutes", "price"] {
        assert_eq!(json["data"][field][0], "This field is required.", "{field}");
    }
}

#[tokio::test]
async fn create_recipe_rejects_bad_numbers_per_field() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let cases: [(&str, Value, &str); 4] = [
        ("price", json!("1000.00"), "Ensure that there are no more than 3 digits before the decimal point."),
        ("price", json!("1.234"), "Ensure that there are no more than 2 decimal places."),
        ("price", json!("-1.00"), "Ensure this value is greater than or equal to 0."),
        ("time_minutes", json!("abc"), "A valid integer is required."),
    ];

    for (field, value, message) in cases {
        let mut payload: Value = json!({ "title": "Sample recipe", "time_minutes": 30, "price": "5.00" });
        payload[field] = value.clone();

        let resp: reqwest::Response = app.post(&token, RECIPES_URL).json(&payload).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{field}={value}");

        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["data"][field][0], message, "{field}={value}");
    }
}

#[tokio::test]
async fn create_recipe_accepts_numeric_minutes_string() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let recipe: Value = app.create_recipe(&token, json!({ "time_minutes": "30" })).await;

    assert_eq!(recipe["time_minutes"], 30);
}

#[tokio::test]
async fn create_recipe_with_new_tags() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let recipe: Value = app
        .create_recipe(&token, json!({ "tags": [{ "name": "Thai" }, { "name": "Dinner" }] }))
        .await;

    assert_eq!(names(&recipe["tags"]), vec!["Thai", "Dinner"]);
}

#[tokio::test]
async fn create_recipe_with_existing_tag() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    app.post(&token, "/api/recipe/tags/").json(&json!({ "name": "Indian" })).send().await.unwrap();

    let recipe: Value = app
        .create_recipe(&token, json!({ "tags": [{ "name": "Indian" }, { "name": "Breakfast" }] }))
        .await;
    assert_eq!(recipe["tags"].as_array().unwrap().len(), 2);

    // "Indian" was reused, not duplicated
    let tags: Vec<i64> = app.list_ids(&token, "/api/recipe/tags/").await;
    assert_eq!(tags.len(), 2);
}

#[tokio::test]
async fn create_recipe_with_new_ingredients() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let recipe: Value = app
        .create_recipe(&token, json!({ "ingredients": [{ "name": "Cauliflower" }, { "name": "Salt" }] }))
        .await;

    assert_eq!(names(&recipe["ingredients"]), vec!["Cauliflower", "Salt"]);
}

#[tokio::test]
async fn partial_update() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({ "link": "https://example.com/recipe.pdf" })).await;

    let resp: reqwest::Response = app
        .patch(&token, &detail_url(&recipe["id"]))
        .json(&json!({ "title": "New recipe title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["data"]["title"], "New recipe title");
    assert_eq!(json["data"]["link"], "https://example.com/recipe.pdf");
}

#[tokio::test]
async fn full_update() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({ "tags": [{ "name": "Old" }] })).await;

    let payload: Value = json!({
        "title": "New recipe title",
        "link": "https://example.com/new-recipe.pdf",
        "description": "New recipe description",
        "time_minutes": 10,
        "price": "2.50",
    });
    let resp: reqwest::Response = app.put(&token, &detail_url(&recipe["id"])).json(&payload).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = resp.json().await.unwrap();
    for (key, value) in payload.as_object().unwrap() {
        assert_eq!(&json["data"][key], value, "{key}");
    }
    // Absent nested lists are left alone
    assert_eq!(names(&json["data"]["tags"]), vec!["Old"]);
}

#[tokio::test]
async fn full_update_requires_core_fields() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    let resp: reqwest::Response = app
        .put(&token, &detail_url(&recipe["id"]))
        .json(&json!({ "title": "Only a title" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_user_returns_error() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let other: String = app.authenticated_user("other@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    // Any owner field in the payload is ignored
    app.patch(&token, &detail_url(&recipe["id"]))
        .json(&json!({ "user": 2 }))
        .send()
        .await
        .unwrap();

    assert_eq!(app.list_ids(&token, RECIPES_URL).await.len(), 1);
    assert!(app.list_ids(&other, RECIPES_URL).await.is_empty());
}

#[tokio::test]
async fn update_replaces_and_clears_tags() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({ "tags": [{ "name": "Breakfast" }] })).await;
    let url: String = detail_url(&recipe["id"]);

    let json: Value = app
        .patch(&token, &url)
        .json(&json!({ "tags": [{ "name": "Lunch" }] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&json["data"]["tags"]), vec!["Lunch"]);

    let json: Value = app
        .patch(&token, &url)
        .json(&json!({ "tags": [] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(json["data"]["tags"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_replaces_ingredients() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({ "ingredients": [{ "name": "Pepper" }] })).await;

    let json: Value = app
        .patch(&token, &detail_url(&recipe["id"]))
        .json(&json!({ "ingredients": [{ "name": "Chili" }] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(names(&json["data"]["ingredients"]), vec!["Chili"]);
}

#[tokio::test]
async fn delete_recipe() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let recipe: Value = app.create_recipe(&token, json!({})).await;

    let resp: reqwest::Response = app.delete(&token, &detail_url(&recipe["id"])).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.text().await.unwrap().is_empty());

    assert!(app.list_ids(&token, RECIPES_URL).await.is_empty());
}

#[tokio::test]
async fn delete_other_users_recipe_error() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    let other: String = app.authenticated_user("other@example.com").await;
    let recipe: Value = app.create_recipe(&other, json!({})).await;

    let resp: reqwest::Response = app.delete(&token, &detail_url(&recipe["id"])).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(app.list_ids(&other, RECIPES_URL).await.len(), 1);
}
