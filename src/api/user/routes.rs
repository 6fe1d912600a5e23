// User account route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::config::state::AppState;
use super::handler;

/// Registration and login, reachable without a token
pub fn public_user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/create/", post(handler::create_user_handler))
        .route("/api/user/token/", post(handler::create_token_handler))
}

/// The caller's own profile
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/user/me/",
            get(handler::get_me_handler)
                .put(handler::replace_me_handler)
                .patch(handler::update_me_handler),
        )
}
