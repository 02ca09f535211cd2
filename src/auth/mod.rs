pub mod password;
pub mod tokens;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::database::models::User;
use crate::error::ApiError;

pub use password::{hash_password, verify_password};
pub use tokens::TokenService;

/// Who made the request, as resolved by the authenticate middleware.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous,
    Authenticated(User),
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Anonymous => None,
            AuthState::Authenticated(user) => Some(user),
        }
    }
}

/// Extracts the authenticated user, rejecting anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthState>() {
            Some(AuthState::Authenticated(user)) => Ok(CurrentUser(user.clone())),
            _ => Err(ApiError::authentication_required()),
        }
    }
}
