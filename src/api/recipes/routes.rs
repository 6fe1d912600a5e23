// Recipe route definitions

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::config::state::AppState;
use super::handler;

/// Recipe CRUD plus image upload. The upload route gets its own, larger body limit.
pub fn recipe_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/recipe/recipes/",
            get(handler::list_recipes_handler).post(handler::create_recipe_handler),
        )
        .route(
            "/api/recipe/recipes/{id}/",
            get(handler::get_recipe_handler)
                .put(handler::replace_recipe_handler)
                .patch(handler::patch_recipe_handler)
                .delete(handler::delete_recipe_handler),
        )
        .route(
            "/api/recipe/recipes/{id}/upload-image/",
            post(handler::upload_image_handler)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
}
