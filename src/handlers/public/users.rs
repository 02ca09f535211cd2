// handlers/public/users.rs - account registration, activation and password reset

use axum::extract::State;
use serde::Deserialize;

use crate::auth::hash_password;
use crate::database::models::permission::DEFAULT_GRANTS;
use crate::database::models::token::validate_token_plaintext;
use crate::database::models::user::{validate_password_plaintext, validate_user, NewUser};
use crate::database::models::{Scope, User};
use crate::database::{DatabaseError, Store};
use crate::error::ApiError;
use crate::handlers::utils::{notify_in_background, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::notify::Notification;
use crate::state::AppState;
use crate::validator::Validator;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivationInput {
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordResetInput {
    pub password: String,
    pub token: String,
}

/// POST /api/v1/users - register a new, not yet activated account
///
/// The activation token is delivered in the background; the response does
/// not wait for it.
pub async fn register_user(State(state): State<AppState>, JsonBody(input): JsonBody<NewUser>) -> ApiResult {
    let mut v = Validator::new();
    validate_user(&mut v, &input);
    if !v.is_valid() {
        return Err(v.into());
    }

    let user = User {
        username: input.username,
        email: input.email,
        password_hash: hash_password(&input.password)?,
        activated: false,
        ..User::default()
    };

    let user = match state.users.insert(&user).await {
        Err(DatabaseError::Conflict(_)) => {
            return Err(ApiError::field("email", "a user with this email address already exists"));
        }
        result => result?,
    };

    state.permissions.add_for_user(user.id, DEFAULT_GRANTS).await?;

    let token = state
        .tokens
        .issue(user.id, state.config.tokens.activation_ttl(), Scope::Activation)
        .await?;

    notify_in_background(
        &state,
        user.email.clone(),
        Notification::Welcome {
            user_id: user.id,
            activation_token: token.plaintext,
        },
    );

    Ok(ApiResponse::envelope("user", &user).created(AppState::location("users", user.id)))
}

/// PUT /api/v1/users/activated - exchange an activation token for an active account
pub async fn activate_user(State(state): State<AppState>, JsonBody(input): JsonBody<ActivationInput>) -> ApiResult {
    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &input.token);
    if !v.is_valid() {
        return Err(v.into());
    }

    let mut user = match state.tokens.get_for_token(Scope::Activation, &input.token).await {
        Err(DatabaseError::NotFound) => {
            return Err(ApiError::field("token", "invalid or expired activation token"));
        }
        result => result?,
    };

    user.activated = true;
    let user = state.users.update(&user).await?;
    state.tokens.delete_all_for_user(Scope::Activation, user.id).await?;

    Ok(ApiResponse::envelope("user", &user))
}

/// PUT /api/v1/users/password - set a new password with a password-reset token
pub async fn update_user_password(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<PasswordResetInput>,
) -> ApiResult {
    let mut v = Validator::new();
    validate_password_plaintext(&mut v, &input.password);
    validate_token_plaintext(&mut v, &input.token);
    if !v.is_valid() {
        return Err(v.into());
    }

    let mut user = match state.tokens.get_for_token(Scope::PasswordReset, &input.token).await {
        Err(DatabaseError::NotFound) => {
            return Err(ApiError::field("token", "invalid or expired password reset token"));
        }
        result => result?,
    };

    user.password_hash = hash_password(&input.password)?;
    state.users.update(&user).await?;
    state.tokens.delete_all_for_user(Scope::PasswordReset, user.id).await?;

    Ok(ApiResponse::message("your password was successfully reset"))
}
