// Tag and ingredient handlers. Both kinds share the same list/create behavior.

use axum::{
    extract::{rejection::JsonRejection, Extension, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::api::middleware::AuthUser;
use crate::config::state::AppState;
use crate::models::attribute::AttributeRequest;
use crate::models::validation::ValidationErrors;
use crate::models::AttributeKind;
use crate::utils::response_handler::HandlerResponse;
use crate::utils::utils::parse_int_flag;

#[derive(Debug, Default, Deserialize)]
pub struct AttributeListParams {
    pub assigned_only: Option<String>,
}

async fn list_attributes(
    kind: AttributeKind,
    state: AppState,
    user: AuthUser,
    params: AttributeListParams,
) -> HandlerResponse {
    let assigned_only: bool = match parse_int_flag(params.assigned_only.as_deref()) {
        Ok(flag) => flag,
        Err(message) => return HandlerResponse::validation(ValidationErrors::single("assigned_only", message)),
    };

    match state.store.list_attributes(kind, user.0.id, assigned_only).await {
        Ok(attributes) => HandlerResponse::new(StatusCode::OK).data(json!(attributes)),
        Err(e) => HandlerResponse::from_store_error(&format!("Failed to list {kind}s"), e),
    }
}

async fn create_attribute(
    kind: AttributeKind,
    state: AppState,
    user: AuthUser,
    payload: Result<Json<AttributeRequest>, JsonRejection>,
) -> HandlerResponse {
    let name: String = match payload {
        Ok(Json(request)) => match request.validate() {
            Ok(name) => name,
            Err(errors) => return HandlerResponse::validation(errors),
        },
        Err(rejection) => return HandlerResponse::json_rejection(rejection),
    };

    match state.store.create_attribute(kind, user.0.id, &name).await {
        Ok(attribute) => {
            info!("Created {} {} for user {}", kind, attribute, user.0.id);
            HandlerResponse::new(StatusCode::CREATED)
                .data(json!(attribute))
                .message(format!("{kind} created successfully"))
        }
        Err(e) => HandlerResponse::from_store_error(&format!("Failed to create {kind}"), e),
    }
}

/// Lists the caller's tags
#[instrument(name = "list_tags", skip_all, fields(user_id = user.0.id))]
pub async fn list_tags_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AttributeListParams>,
) -> HandlerResponse {
    list_attributes(AttributeKind::Tag, state, user, params).await
}

/// Creates a tag owned by the caller
#[instrument(name = "create_tag", skip_all, fields(user_id = user.0.id))]
pub async fn create_tag_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<AttributeRequest>, JsonRejection>,
) -> HandlerResponse {
    create_attribute(AttributeKind::Tag, state, user, payload).await
}

/// Lists the caller's ingredients
#[instrument(name = "list_ingredients", skip_all, fields(user_id = user.0.id))]
pub async fn list_ingredients_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AttributeListParams>,
) -> HandlerResponse {
    list_attributes(AttributeKind::Ingredient, state, user, params).await
}

/// Creates an ingredient owned by the caller
#[instrument(name = "create_ingredient", skip_all, fields(user_id = user.0.id))]
pub async fn create_ingredient_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<AttributeRequest>, JsonRejection>,
) -> HandlerResponse {
    create_attribute(AttributeKind::Ingredient, state, user, payload).await
}
