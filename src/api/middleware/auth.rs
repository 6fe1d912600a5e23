// Token authentication for private routes

use axum::{
    extract::{Request, State},
    http::{header::{AUTHORIZATION, WWW_AUTHENTICATE}, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::config::state::AppState;
use crate::models::User;
use crate::utils::response_handler::HandlerResponse;

/// Keyword expected in `Authorization: Token <key>`
pub const TOKEN_KEYWORD: &str = "Token";

pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
pub const INVALID_TOKEN: &str = "Invalid token.";
pub const INACTIVE_USER: &str = "User inactive or deleted.";

/// The authenticated caller, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

fn unauthorized(message: &str) -> Response {
    (
        [(WWW_AUTHENTICATE, HeaderValue::from_static(TOKEN_KEYWORD))],
        HandlerResponse::new(StatusCode::UNAUTHORIZED).message(message),
    )
        .into_response()
}

/// Pulls the key out of the Authorization header.
/// `Ok(None)` when the header is absent or uses another scheme.
fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value: &str = value
        .to_str()
        .map_err(|_| "Invalid token header. Token string should not contain invalid characters.")?;

    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(keyword) if keyword.eq_ignore_ascii_case(TOKEN_KEYWORD) => {}
        _ => return Ok(None),
    }

    match (parts.next(), parts.next()) {
        (None, _) => Err("Invalid token header. No credentials provided."),
        (Some(_), Some(_)) => Err("Invalid token header. Token string should not contain spaces."),
        (Some(token), None) => Ok(Some(token)),
    }
}

/// Resolves a token to its user via the cache, then the store
async fn authenticate(state: &AppState, token: &str) -> Result<User, Response> {
    if let Some(cache) = &state.token_cache {
        match cache.cached_user_id(token).await {
            Ok(Some(user_id)) => match state.store.find_user_by_id(user_id).await {
                Ok(Some(user)) if user.is_active => {
                    debug!("Token for user {} validated via Redis cache", user.id);
                    return Ok(user);
                }
                Ok(_) => {}
                Err(e) => warn!("User lookup for cached token failed: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Token cache lookup failed: {:#}", e),
        }
    }

    let user: User = match state.store.find_user_by_token(token).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(unauthorized(INVALID_TOKEN)),
        Err(e) => {
            return Err(HandlerResponse::internal("Failed to validate token", e).into_response());
        }
    };

    if !user.is_active {
        return Err(unauthorized(INACTIVE_USER));
    }

    if let Some(cache) = &state.token_cache {
        if let Err(e) = cache.cache_token(token, user.id).await {
            // Don't fail request if cache fails, just log it
            warn!("Failed to cache token for user {}: {:#}", user.id, e);
        }
    }

    debug!("Token for user {} validated via store", user.id);
    Ok(user)
}

/// Middleware rejecting requests without a valid token.
/// On success the caller is available to handlers as `Extension<AuthUser>`.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token: &str = match extract_token(&headers) {
        Ok(Some(token)) => token,
        Ok(None) => return Err(unauthorized(NOT_AUTHENTICATED)),
        Err(message) => return Err(unauthorized(message)),
    };

    let user: User = authenticate(&state, token).await?;
    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}
