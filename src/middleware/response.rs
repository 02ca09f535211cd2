use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// JSON success body in which every payload sits under a named key,
/// e.g. `{"book": {...}}` or `{"books": [...], "metadata": {...}}`.
#[derive(Debug)]
pub struct ApiResponse {
    body: Result<Map<String, Value>, serde_json::Error>,
    status_code: StatusCode,
    location: Option<String>,
}

impl ApiResponse {
    /// 200 with `data` under `key`.
    pub fn envelope<T: Serialize>(key: &str, data: T) -> Self {
        Self {
            body: Ok(Map::new()),
            status_code: StatusCode::OK,
            location: None,
        }
        .with(key, data)
    }

    /// `{"message": ...}` body.
    pub fn message(message: &str) -> Self {
        Self::envelope("message", message)
    }

    /// Adds another top-level key to the body.
    pub fn with<T: Serialize>(mut self, key: &str, data: T) -> Self {
        self.body = self.body.and_then(|mut body| {
            body.insert(key.to_string(), serde_json::to_value(data)?);
            Ok(body)
        });
        self
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// 201 Created with a `Location` header for the new resource.
    pub fn created(self, location: impl Into<String>) -> Self {
        let mut response = self.with_status(StatusCode::CREATED);
        response.location = Some(location.into());
        response
    }

    pub fn accepted(self) -> Self {
        self.with_status(StatusCode::ACCEPTED)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return ApiError::server_error().into_response();
            }
        };

        let mut response = (self.status_code, Json(Value::Object(body))).into_response();
        if let Some(location) = self.location {
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    response.headers_mut().insert(header::LOCATION, value);
                }
                Err(e) => tracing::warn!("Dropping invalid Location header {:?}: {}", location, e),
            }
        }
        response
    }
}

pub type ApiResult = Result<ApiResponse, ApiError>;

/// Gives the router's bare 405 responses the standard JSON error body.
pub async fn method_not_allowed(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED || response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }

    let mut replacement = ApiError::method_not_allowed(method.as_str()).into_response();
    if let Some(allow) = response.headers().get(header::ALLOW) {
        replacement.headers_mut().insert(header::ALLOW, allow.clone());
    }
    replacement
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::json;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn envelopes_payload_under_key() {
        let response = ApiResponse::envelope("book", json!({"id": 1}))
            .with("metadata", json!({"total_records": 1}))
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"book": {"id": 1}, "metadata": {"total_records": 1}})
        );
    }

    #[tokio::test]
    async fn created_sets_location() {
        let response = ApiResponse::envelope("book", json!({"id": 7}))
            .created("/api/v1/books/7")
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/api/v1/books/7");
    }
}
