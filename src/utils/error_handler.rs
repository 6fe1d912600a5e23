// Global error handling for HTTP middleware layers

use axum::{
    BoxError,
    http::StatusCode,
    response::IntoResponse,
};
use std::error::Error;
// tower's error type for timeouts
use tower::timeout::error::Elapsed;
// Axum uses http_body_util for length-limiting
use http_body_util::LengthLimitError;
use tracing::{error, warn};

use crate::utils::response_handler::HandlerResponse;

/// Maps errors raised by the tower layers to HTTP responses
pub async fn handle_global_error(err: BoxError) -> impl IntoResponse {
    status_for_error(&err)
}

fn status_for_error(err: &BoxError) -> HandlerResponse {
    // 413 if the body was too large
    if err.is::<LengthLimitError>() || find_cause::<LengthLimitError>(&**err).is_some() {
        warn!("Request body too large: {}", err);
        return HandlerResponse::new(StatusCode::PAYLOAD_TOO_LARGE)
            .message("Request body too large");
    }

    // 408 if the request took too long
    if err.is::<Elapsed>() {
        warn!("Request timed out");
        return HandlerResponse::new(StatusCode::REQUEST_TIMEOUT)
            .message("Request timeout");
    }

    // Otherwise, 500
    error!("Unhandled internal error: {}", err);
    HandlerResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
        .message("Unhandled internal error")
}

/// Fallback for routes that do not exist
pub async fn fallback_handler() -> HandlerResponse {
    HandlerResponse::new(StatusCode::NOT_FOUND)
        .message("The requested route does not exist")
}

/// Helper function to find specific error type in error chain
pub fn find_cause<T: Error + 'static>(err: &dyn Error) -> Option<&T> {
    let mut source: Option<&dyn Error> = err.source();

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}
