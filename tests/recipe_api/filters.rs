//! tests/recipe_api/filters.rs
//! Filtering /api/recipe/recipes/ by tag and ingredient ids.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

fn id(value: &Value) -> i64 {
    value["id"].as_i64().unwrap()
}

#[tokio::test]
async fn filter_by_tags() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let curry: Value = app.create_recipe(&token, json!({ "title": "Thai Vegetable Curry", "tags": [{ "name": "Vegan" }] })).await;
    let tahini: Value = app.create_recipe(&token, json!({ "title": "Aubergine with Tahini", "tags": [{ "name": "Vegetarian" }] })).await;
    let fish: Value = app.create_recipe(&token, json!({ "title": "Fish and chips" })).await;

    let tags: String = format!("{},{}", id(&curry["tags"][0]), id(&tahini["tags"][0]));
    let ids: Vec<i64> = app.list_ids(&token, &format!("/api/recipe/recipes/?tags={tags}")).await;

    assert!(ids.contains(&id(&curry)));
    assert!(ids.contains(&id(&tahini)));
    assert!(!ids.contains(&id(&fish)));
}

#[tokio::test]
async fn filter_by_ingredients() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let beans: Value = app.create_recipe(&token, json!({ "title": "Posh Beans on Toast", "ingredients": [{ "name": "Feta Cheese" }] })).await;
    let chicken: Value = app.create_recipe(&token, json!({ "title": "Chicken Cacciatore", "ingredients": [{ "name": "Chicken" }] })).await;
    let steak: Value = app.create_recipe(&token, json!({ "title": "Steak and mushrooms" })).await;

    let ingredients: String = format!("{},{}", id(&beans["ingredients"][0]), id(&chicken["ingredients"][0]));
    let ids: Vec<i64> = app.list_ids(&token, &format!("/api/recipe/recipes/?ingredients={ingredients}")).await;

    assert_eq!(ids, vec![id(&chicken), id(&beans)]);
    assert!(!ids.contains(&id(&steak)));
}

#[tokio::test]
async fn filters_combine_and_return_each_recipe_once() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let both: Value = app
        .create_recipe(&token, json!({
            "tags": [{ "name": "Quick" }, { "name": "Cheap" }],
            "ingredients": [{ "name": "Rice" }],
        }))
        .await;
    let tag_only: Value = app.create_recipe(&token, json!({ "tags": [{ "name": "Quick" }] })).await;

    let tags: String = format!("{},{}", id(&both["tags"][0]), id(&both["tags"][1]));
    let rice: i64 = id(&both["ingredients"][0]);

    let ids: Vec<i64> = app.list_ids(&token, &format!("/api/recipe/recipes/?tags={tags}")).await;
    assert_eq!(ids, vec![id(&tag_only), id(&both)]);

    let ids: Vec<i64> = app.list_ids(&token, &format!("/api/recipe/recipes/?tags={tags}&ingredients={rice}")).await;
    assert_eq!(ids, vec![id(&both)]);
}

#[tokio::test]
async fn empty_filter_means_no_filter() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;
    app.create_recipe(&token, json!({})).await;

    let ids: Vec<i64> = app.list_ids(&token, "/api/recipe/recipes/?tags=").await;
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn non_integer_ids_are_rejected() {
    let app: common::TestApp = common::spawn_app();
    let token: String = app.authenticated_user("user@example.com").await;

    let resp: reqwest::Response = app.get(&token, "/api/recipe/recipes/?tags=1,abc").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = resp.json().await.unwrap();
    assert!(json["data"]["tags"].is_array());
}
