// Unified response system for consistent API responses
// Provides HandlerResponse struct and middleware for standardizing all responses

use axum::{
    body::Body,
    extract::rejection::JsonRejection,
    http::{
        header::CONTENT_TYPE, HeaderValue, Request, Response,
        response::Parts, StatusCode, Extensions
    },
    Json,
    middleware::Next,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::{debug, error};
use std::convert::Infallible;
use serde_json::{json, Value};
use serde::{Serialize, Deserialize};

use crate::database::store::StoreError;
use crate::models::validation::ValidationErrors;
use crate::utils::utils::to_two_space_indented_json;

/// Standard JSON response format for all API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseFormat {
    pub status: String,          // HTTP status text (e.g. "OK", "NOT_FOUND")
    pub code: u16,               // HTTP status code
    pub data: serde_json::Value, // Response payload
    pub messages: Vec<String>,   // Informational messages
    pub date: String,            // ISO timestamp
}

/// Convenience struct for building responses in handlers
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status_code: StatusCode,
    pub data: serde_json::Value,
    pub messages: Vec<String>,
}

impl HandlerResponse {
    /// Creates a new response with specified status code
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            data: serde_json::Value::Null,
            messages: Vec::new(),
        }
    }

    /// Adds JSON data payload to the response
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Adds an informational message to the response
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// 400 carrying `{ field: [messages] }`
    pub fn validation(errors: ValidationErrors) -> Self {
        Self::new(StatusCode::BAD_REQUEST)
            .message("Validation failed")
            .data(json!(errors))
    }

    /// Keeps the rejection's own status (400, 413, 415 or 422)
    pub fn json_rejection(rejection: JsonRejection) -> Self {
        Self::new(rejection.status())
            .message(rejection.body_text())
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND).message("Not found.")
    }

    /// Logs the failure and hides backend details behind a 500
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR).message(context)
    }

    pub fn from_store_error(context: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::not_found(),
            StoreError::AlreadyExists(detail) => Self::new(StatusCode::CONFLICT)
                .message(context)
                .data(json!({ "error": detail })),
            StoreError::Storage(_) => Self::internal(context, err),
        }
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> axum::response::Response {
        let mut response: Response<Body> = Json(json!({
            "data": self.data,
            "messages": self.messages
        })).into_response();

        *response.status_mut() = self.status_code;

        // Store HandlerResponse in extensions for middleware processing
        response.extensions_mut().insert(self);
        response
    }
}

fn create_default_status_message(parts: &Parts) -> String {
    parts.status
        .canonical_reason()
        .unwrap_or("UNKNOWN STATUS")
        .to_string()
}

/// Extracts response data and messages from HandlerResponse extensions
fn extract_response_components(response: &Response<Body>) -> (Vec<String>, Value) {
    let extensions: &Extensions = response.extensions();
    let structured_response: Option<&HandlerResponse> = extensions.get::<HandlerResponse>();

    match structured_response {
        Some(r) => (r.messages.clone(), r.data.clone()),
        None => (Vec::new(), Value::Null),
    }
}

/// Logs the formatted response with proper JSON indentation
fn log_formatted_response(wrapped: &ResponseFormat) {
    match to_two_space_indented_json(wrapped) {
        Ok(spaced_json) => debug!("\nFinal response:\n{}", spaced_json),
        Err(err) => error!("Failed to format response JSON: {:?}", err),
    }
}

/// Builds the final response with JSON content type
fn build_final_response(parts: Parts, wrapped: &ResponseFormat) -> Response<Body> {
    let json_body: Vec<u8> = serde_json::to_vec(wrapped).unwrap_or_else(|_| b"{}".to_vec());
    let mut new_parts: Parts = parts;

    new_parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    new_parts.headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json")
    );

    Response::from_parts(new_parts, Body::from(json_body))
}

/// Wraps a status, data and messages into the envelope
pub fn envelope(status: StatusCode, data: Value, messages: Vec<String>) -> ResponseFormat {
    let default_status: String = status
        .canonical_reason()
        .unwrap_or("UNKNOWN STATUS")
        .to_string();

    ResponseFormat {
        status: default_status.to_uppercase().replace(' ', "_"),
        code: status.as_u16(),
        data,
        messages,
        date: Utc::now().to_rfc3339(),
    }
}

/// Middleware that wraps all responses in the standard ResponseFormat structure.
/// 204 responses must stay bodiless and pass through untouched.
pub async fn response_wrapper(
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, Infallible> {
    let response: Response<Body> = next.run(req).await;

    if response.status() == StatusCode::NO_CONTENT {
        return Ok(response);
    }

    let (messages, data) = extract_response_components(&response);
    let (parts, _) = response.into_parts();

    let mut wrapped: ResponseFormat = envelope(parts.status, data, messages);
    if wrapped.messages.is_empty() && (parts.status.is_client_error() || parts.status.is_server_error()) {
        wrapped.messages.push(create_default_status_message(&parts));
    }

    log_formatted_response(&wrapped);

    Ok(build_final_response(parts, &wrapped))
}
