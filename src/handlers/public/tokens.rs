// handlers/public/tokens.rs - token issuance

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use crate::auth::verify_password;
use crate::database::models::user::{validate_email, validate_password_plaintext, Credentials};
use crate::database::models::Scope;
use crate::database::{DatabaseError, UserStore};
use crate::error::ApiError;
use crate::handlers::utils::{notify_in_background, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::notify::Notification;
use crate::state::AppState;
use crate::validator::Validator;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmailInput {
    pub email: String,
}

/// POST /api/v1/tokens/authentication - trade email and password for a bearer token
///
/// Unknown email and wrong password produce the same 401.
pub async fn create_authentication_token(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<Credentials>,
) -> ApiResult {
    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    if !v.is_valid() {
        return Err(v.into());
    }

    let user = match state.users.get_by_email(&input.email).await {
        Err(DatabaseError::NotFound) => return Err(ApiError::invalid_credentials()),
        result => result?,
    };

    if !verify_password(&input.password, &user.password_hash)? {
        return Err(ApiError::invalid_credentials());
    }

    let token = state
        .tokens
        .issue(user.id, state.config.tokens.authentication_ttl(), Scope::Authentication)
        .await?;

    Ok(ApiResponse::envelope("authentication_token", &token).with_status(StatusCode::CREATED))
}

/// POST /api/v1/tokens/password-reset - send a password-reset token to an activated account
pub async fn create_password_reset_token(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<EmailInput>,
) -> ApiResult {
    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    if !v.is_valid() {
        return Err(v.into());
    }

    let user = match state.users.get_by_email(&input.email).await {
        Err(DatabaseError::NotFound) => return Err(ApiError::field("email", "no matching email address found")),
        result => result?,
    };

    if !user.activated {
        return Err(ApiError::field("email", "user account must be activated"));
    }

    let token = state
        .tokens
        .issue(user.id, state.config.tokens.password_reset_ttl(), Scope::PasswordReset)
        .await?;

    notify_in_background(
        &state,
        user.email.clone(),
        Notification::PasswordReset { reset_token: token.plaintext },
    );

    Ok(ApiResponse::message("an email will be sent to you containing password reset instructions").accepted())
}
