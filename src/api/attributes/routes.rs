// Tag and ingredient route definitions

use axum::{routing::get, Router};

use crate::config::state::AppState;
use super::handler;

pub fn attribute_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/recipe/tags/",
            get(handler::list_tags_handler).post(handler::create_tag_handler),
        )
        .route(
            "/api/recipe/ingredients/",
            get(handler::list_ingredients_handler).post(handler::create_ingredient_handler),
        )
}
