// HTTP API Error Types
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::password::PasswordError;
use crate::database::DatabaseError;
use crate::validator::Validator;

pub const SERVER_ERROR_MESSAGE: &str = "the server encountered a problem and could not process your request";
pub const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";
pub const EDIT_CONFLICT_MESSAGE: &str = "unable to update the record due to an edit conflict, please try again";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),
    InvalidToken,

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity
    UnprocessableEntity { field_errors: HashMap<String, String> },

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::InvalidToken => "invalid or missing authentication token",
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::MethodNotAllowed(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::UnprocessableEntity { .. } => "the request failed validation",
            ApiError::TooManyRequests(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::UnprocessableEntity { field_errors } => json!({ "error": field_errors }),
            _ => json!({ "error": self.message() }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable_entity(field_errors: HashMap<String, String>) -> Self {
        ApiError::UnprocessableEntity { field_errors }
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    pub fn resource_not_found() -> Self {
        Self::not_found(NOT_FOUND_MESSAGE)
    }

    pub fn edit_conflict() -> Self {
        Self::conflict(EDIT_CONFLICT_MESSAGE)
    }

    pub fn server_error() -> Self {
        Self::internal_server_error(SERVER_ERROR_MESSAGE)
    }

    pub fn method_not_allowed(method: &str) -> Self {
        ApiError::MethodNotAllowed(format!("the {} method is not supported for this resource", method))
    }

    pub fn rate_limit_exceeded() -> Self {
        Self::too_many_requests("rate limit exceeded")
    }

    pub fn invalid_credentials() -> Self {
        Self::unauthorized("invalid authentication credentials")
    }

    pub fn authentication_required() -> Self {
        Self::unauthorized("you must be authenticated to access this resource")
    }

    pub fn inactive_account() -> Self {
        Self::forbidden("your user account must be activated to access this resource")
    }

    /// 422 carrying every field error collected by the validator.
    pub fn failed_validation(v: Validator) -> Self {
        Self::unprocessable_entity(v.into_errors())
    }

    /// 422 for a single field.
    pub fn field(key: &str, message: &str) -> Self {
        let mut v = Validator::new();
        v.add_error(key, message);
        Self::failed_validation(v)
    }
}

impl From<Validator> for ApiError {
    fn from(v: Validator) -> Self {
        ApiError::failed_validation(v)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound => ApiError::resource_not_found(),
            DatabaseError::EditConflict => ApiError::edit_conflict(),
            DatabaseError::Conflict(constraint) => {
                tracing::debug!("Unique constraint violated: {}", constraint);
                ApiError::conflict("a record with these details already exists")
            }
            DatabaseError::Timeout => {
                tracing::error!("Database query timed out");
                ApiError::service_unavailable("the database is temporarily unavailable, please try again")
            }
            DatabaseError::Filter(e) => {
                // Filters are validated before they reach a store
                tracing::error!("Filter rejected by store: {}", e);
                ApiError::server_error()
            }
            DatabaseError::Sqlx(e) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", e);
                ApiError::server_error()
            }
            DatabaseError::Migration(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::server_error()
            }
            DatabaseError::ConfigMissing(key) => {
                tracing::error!("Missing configuration: {}", key);
                ApiError::server_error()
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        ApiError::server_error()
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status_code(), Json(self.to_json())).into_response();
        if matches!(self, ApiError::InvalidToken) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
