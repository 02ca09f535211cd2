use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthState;
use crate::database::PermissionStore;
use crate::error::ApiError;

fn auth_state(request: &Request) -> &AuthState {
    request.extensions().get::<AuthState>().unwrap_or(&AuthState::Anonymous)
}

/// Requires an authenticated, activated user.
pub async fn require_activated_user(request: Request, next: Next) -> Result<Response, ApiError> {
    match auth_state(&request) {
        AuthState::Anonymous => Err(ApiError::authentication_required()),
        AuthState::Authenticated(user) if !user.activated => Err(ApiError::inactive_account()),
        AuthState::Authenticated(_) => Ok(next.run(request).await),
    }
}

/// Permission code a route requires, plus where to look grants up.
#[derive(Clone)]
pub struct PermissionGate {
    permissions: Arc<dyn PermissionStore>,
    code: &'static str,
}

impl PermissionGate {
    pub fn new(permissions: Arc<dyn PermissionStore>, code: &'static str) -> Self {
        Self { permissions, code }
    }
}

/// Requires the route's permission code. Missing grants answer 404 so that
/// unauthorized callers cannot probe which resources exist.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = match auth_state(&request) {
        AuthState::Authenticated(user) => user.id,
        AuthState::Anonymous => return Err(ApiError::authentication_required()),
    };

    let permissions = gate.permissions.get_all_for_user(user_id).await?;
    if !permissions.includes(gate.code) {
        tracing::debug!(user_id, code = gate.code, "permission denied");
        return Err(ApiError::resource_not_found());
    }

    Ok(next.run(request).await)
}
