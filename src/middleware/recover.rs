use std::any::Any;

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::error::ApiError;

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

/// Turns a handler panic into a 500 and asks the client to drop the connection.
///
/// Installed through `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    error!(panic_message = %panic_message(panic.as_ref()), "Handler panicked");

    let mut response = ApiError::server_error().into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
