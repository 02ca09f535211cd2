use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AuthState;
use crate::database::models::token::validate_token_plaintext;
use crate::database::models::Scope;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validator::Validator;

/// Resolves the bearer token (if any) into an [`AuthState`] request extension.
///
/// A missing header yields [`AuthState::Anonymous`]; a malformed or unknown
/// token ends the request with 401.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let mut response = match resolve(&state, request.headers()).await {
        Ok(auth) => {
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

async fn resolve(state: &AppState, headers: &HeaderMap) -> Result<AuthState, ApiError> {
    let token = match extract_bearer_token(headers)? {
        Some(token) => token,
        None => return Ok(AuthState::Anonymous),
    };

    let mut v = Validator::new();
    validate_token_plaintext(&mut v, token);
    if !v.is_valid() {
        return Err(ApiError::InvalidToken);
    }

    match state.tokens.get_for_token(Scope::Authentication, token).await {
        Ok(user) => Ok(AuthState::Authenticated(user)),
        Err(DatabaseError::NotFound) => Err(ApiError::InvalidToken),
        Err(e) => Err(e.into()),
    }
}

/// `Ok(None)` when no Authorization header is present.
fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| ApiError::InvalidToken)?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(Some(token)),
        _ => Err(ApiError::InvalidToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn accepts_exactly_bearer_and_token() {
        let h = headers("Bearer ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(extract_bearer_token(&h).unwrap(), Some("ABCDEFGHIJKLMNOPQRSTUVWXYZ"));
    }

    #[test]
    fn rejects_malformed_headers() {
        for value in ["Basic abc", "Bearer", "Bearer a b", "bearer abc", "Bearer "] {
            assert!(
                matches!(extract_bearer_token(&headers(value)), Err(ApiError::InvalidToken)),
                "{:?} should be rejected",
                value
            );
        }
    }
}
