// User account handlers: registration, token login and the caller's profile

use anyhow::Error;
use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::api::middleware::AuthUser;
use crate::config::state::AppState;
use crate::core::accounts::{create_user, generate_token};
use crate::core::password::{hash_password, verify_password};
use crate::database::store::StoreError;
use crate::models::user::{
    normalize_email, AccountFields, CreateUserRequest, TokenRequest, TokenResponse,
    UpdateUserRequest, UserProfile,
};
use crate::models::validation::{check_text, ValidationErrors};
use crate::models::{User, UserChanges};
use crate::utils::response_handler::HandlerResponse;

const DUPLICATE_EMAIL: &str = "user with this email already exists.";
const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

fn duplicate_email() -> HandlerResponse {
    HandlerResponse::validation(ValidationErrors::single("email", DUPLICATE_EMAIL))
}

/// Registers a new user
#[instrument(name = "create_user", skip_all)]
pub async fn create_user_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> HandlerResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return HandlerResponse::json_rejection(rejection),
    };

    let fields: AccountFields = match request.validate() {
        Ok(fields) => fields,
        Err(errors) => return HandlerResponse::validation(errors),
    };
    let (Some(email), Some(password), Some(name)) = (fields.email, fields.password, fields.name) else {
        return HandlerResponse::new(StatusCode::BAD_REQUEST).message("Incomplete user payload");
    };

    let result: anyhow::Result<User> = create_user(
        state.store.as_ref(),
        &email,
        &password,
        &name,
        state.environment.bcrypt_cost,
    )
    .await;

    match result {
        Ok(user) => {
            info!("Created user {}", user);
            HandlerResponse::new(StatusCode::CREATED)
                .data(json!(UserProfile::from(&user)))
                .message("User created successfully")
        }
        Err(e) if is_duplicate(&e) => duplicate_email(),
        Err(e) => HandlerResponse::internal("Failed to create user", format!("{:#}", e)),
    }
}

fn is_duplicate(err: &Error) -> bool {
    matches!(err.downcast_ref::<StoreError>(), Some(StoreError::AlreadyExists(_)))
}

/// Exchanges email and password for the user's API token
#[instrument(name = "create_token", skip_all)]
pub async fn create_token_handler(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> HandlerResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return HandlerResponse::json_rejection(rejection),
    };

    let mut errors: ValidationErrors = ValidationErrors::new();
    let email: Option<String> = check_text(&mut errors, "email", request.email, true, false);
    // Passwords are compared untrimmed
    let password: Option<String> = match request.password {
        Some(password) if password.is_empty() => check_text(&mut errors, "password", Some(password), true, false),
        None => check_text(&mut errors, "password", None, true, false),
        password => password,
    };
    let (Some(email), Some(password)) = (email, password) else {
        return HandlerResponse::validation(errors);
    };

    let user: Option<User> = match state.store.find_user_by_email(&normalize_email(&email)).await {
        Ok(user) => user,
        Err(e) => return HandlerResponse::internal("Failed to look up user", e),
    };

    let user: User = match user {
        Some(user) if user.is_active && verify_password(password, user.password_hash.clone()).await => user,
        _ => {
            warn!("Rejected login attempt for {}", email);
            return HandlerResponse::validation(ValidationErrors::single("non_field_errors", BAD_CREDENTIALS));
        }
    };

    match state.store.get_or_create_token(user.id, &generate_token()).await {
        Ok(token) => HandlerResponse::new(StatusCode::OK)
            .data(json!(TokenResponse { token })),
        Err(e) => HandlerResponse::internal("Failed to issue token", e),
    }
}

/// Returns the authenticated user's profile
#[instrument(name = "get_me", skip_all, fields(user_id = user.id))]
pub async fn get_me_handler(Extension(AuthUser(user)): Extension<AuthUser>) -> HandlerResponse {
    HandlerResponse::new(StatusCode::OK).data(json!(UserProfile::from(&user)))
}

/// Full update: email, password and name must all be present
#[instrument(name = "replace_me", skip_all, fields(user_id = user.id))]
pub async fn replace_me_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> HandlerResponse {
    let fields: Result<AccountFields, ValidationErrors> = match payload {
        Ok(Json(request)) => request.validate(),
        Err(rejection) => return HandlerResponse::json_rejection(rejection),
    };
    update_profile(&state, &user, fields).await
}

/// Partial update of any of email, password and name
#[instrument(name = "update_me", skip_all, fields(user_id = user.id))]
pub async fn update_me_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> HandlerResponse {
    let fields: Result<AccountFields, ValidationErrors> = match payload {
        Ok(Json(request)) => request.validate(),
        Err(rejection) => return HandlerResponse::json_rejection(rejection),
    };
    update_profile(&state, &user, fields).await
}

async fn update_profile(
    state: &AppState,
    user: &User,
    fields: Result<AccountFields, ValidationErrors>,
) -> HandlerResponse {
    let fields: AccountFields = match fields {
        Ok(fields) => fields,
        Err(errors) => return HandlerResponse::validation(errors),
    };

    let password_hash: Option<String> = match fields.password {
        Some(password) => match hash_password(password, state.environment.bcrypt_cost).await {
            Ok(hashed) => Some(hashed),
            Err(e) => return HandlerResponse::internal("Failed to process password", format!("{:#}", e)),
        },
        None => None,
    };

    let changes: UserChanges = UserChanges {
        email: fields.email,
        name: fields.name,
        password_hash,
        is_active: None,
    };

    match state.store.update_user(user.id, changes).await {
        Ok(updated) => {
            info!("Updated profile of {}", updated);
            HandlerResponse::new(StatusCode::OK)
                .data(json!(UserProfile::from(&updated)))
                .message("Profile updated successfully")
        }
        Err(StoreError::AlreadyExists(_)) => duplicate_email(),
        Err(e) => HandlerResponse::from_store_error("Failed to update profile", e),
    }
}
