/*
* HTTP surface of the service. Everything except health, registration and
* login sits behind token authentication.
*/

pub mod attributes;
pub mod health;
pub mod middleware;
pub mod recipes;
pub mod user;

use axum::{middleware::from_fn_with_state, Router};

use crate::config::state::AppState;

/// All API routes, with authentication applied to the private ones
pub fn api_routes(state: AppState) -> Router<AppState> {
    let max_upload_size: usize = state.environment.max_upload_size;

    let private: Router<AppState> = Router::new()
        .merge(user::profile_routes())
        .merge(attributes::attribute_routes())
        .merge(recipes::recipe_routes(max_upload_size))
        .route_layer(from_fn_with_state(state, middleware::require_auth));

    Router::new()
        .merge(health::health_routes())
        .merge(user::public_user_routes())
        .merge(private)
}
