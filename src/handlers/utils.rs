use std::collections::HashMap;

use axum::{
    async_trait,
    body::to_bytes,
    extract::{FromRequest, Request},
    http::HeaderMap,
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::auth::CurrentUser;
use crate::database::Entity;
use crate::error::ApiError;
use crate::filter::filter::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_SORT};
use crate::filter::{Filter, Predicate};
use crate::notify::{deliver, Notification};
use crate::state::AppState;
use crate::validator::Validator;

pub const MAX_BODY_BYTES: usize = 256_000;

/// JSON request body: at most [`MAX_BODY_BYTES`], exactly one value, no
/// unknown keys (enforced by the target type). Every failure is a 400.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let bytes = to_bytes(request.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|_| ApiError::bad_request(format!("the body must not be larger than {} bytes", MAX_BODY_BYTES)))?;
        decode_json(&bytes).map(JsonBody)
    }
}

pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("the body must not be empty"));
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(describe_json_error)?;
    de.end()
        .map_err(|_| ApiError::bad_request("the body must only contain a single JSON value"))?;
    Ok(value)
}

fn describe_json_error(err: serde_json::Error) -> ApiError {
    let message = match err.classify() {
        Category::Syntax => format!("the body contains badly-formed JSON (at line {}, column {})", err.line(), err.column()),
        Category::Eof => "the body contains badly-formed JSON".to_string(),
        Category::Data => {
            let text = err.to_string();
            match text.strip_prefix("unknown field `").and_then(|rest| rest.split('`').next()) {
                Some(key) => format!("the body contains unknown key \"{}\"", key),
                None => format!("the body contains incorrect JSON type (at line {}, column {})", err.line(), err.column()),
            }
        }
        Category::Io => "the body could not be read".to_string(),
    };
    ApiError::bad_request(message)
}

/// Path ids that do not parse or are below 1 name no resource.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::resource_not_found()),
    }
}

pub fn read_string(params: &HashMap<String, String>, key: &str, default: &str) -> String {
    params.get(key).cloned().unwrap_or_else(|| default.to_string())
}

pub fn read_int(params: &HashMap<String, String>, key: &str, default: i64, v: &mut Validator) -> i64 {
    match params.get(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
    }
}

/// Validated search predicates and paging for listing `T`.
///
/// Fails with 422 before any store is touched.
pub fn list_request<T: Entity>(params: &HashMap<String, String>) -> Result<(Vec<Predicate>, Filter), ApiError> {
    let mut v = Validator::new();
    let filter = Filter::new(
        read_int(params, "page", DEFAULT_PAGE, &mut v),
        read_int(params, "page_size", DEFAULT_PAGE_SIZE, &mut v),
        read_string(params, "sorting", DEFAULT_SORT),
        T::SORT_SAFELIST,
    );
    filter.validate(&mut v);
    if !v.is_valid() {
        return Err(v.into());
    }

    let predicates = T::SEARCH_FIELDS
        .iter()
        .map(|field| Predicate::search(*field, read_string(params, field.param, "")))
        .collect();
    Ok((predicates, filter))
}

/// Ownership check for writes; other users see the resource as missing.
pub fn ensure_owner(user: &CurrentUser, owner_id: i64) -> Result<(), ApiError> {
    if user.0.id == owner_id {
        Ok(())
    } else {
        Err(ApiError::resource_not_found())
    }
}

/// Optional `X-Expected-Version` request header. When sent, the stored
/// record must still carry that version or the write is an edit conflict.
pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

pub fn check_expected_version(headers: &HeaderMap, current: i32) -> Result<(), ApiError> {
    let Some(raw) = headers.get(EXPECTED_VERSION_HEADER) else {
        return Ok(());
    };
    let expected: i32 = raw
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| ApiError::bad_request("the X-Expected-Version header must be an integer"))?;
    if expected != current {
        return Err(ApiError::edit_conflict());
    }
    Ok(())
}

/// Hands a notification to the background tracker; the response does not wait for it.
pub fn notify_in_background(state: &AppState, recipient: String, notification: Notification) {
    let notifier = state.notifier.clone();
    state.background.spawn(notification.template(), async move {
        if let Err(e) = deliver(notifier.as_ref(), &recipient, &notification).await {
            tracing::error!(template = notification.template(), "Notification not delivered: {:#}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Book, BookPatch};
    use axum::http::StatusCode;

    fn message(err: ApiError) -> String {
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        err.message().to_string()
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = decode_json::<BookPatch>(br#"{"title": "x", "rating": 3}"#).unwrap_err();
        assert_eq!(message(err), "the body contains unknown key \"rating\"");
    }

    #[test]
    fn rejects_multiple_values() {
        let err = decode_json::<BookPatch>(br#"{"title": "x"} {"title": "y"}"#).unwrap_err();
        assert_eq!(message(err), "the body must only contain a single JSON value");
    }

    #[test]
    fn rejects_empty_and_malformed_bodies() {
        assert_eq!(message(decode_json::<BookPatch>(b"  ").unwrap_err()), "the body must not be empty");
        assert!(message(decode_json::<BookPatch>(br#"{"title": "#).unwrap_err()).starts_with("the body contains badly-formed JSON"));
        assert!(message(decode_json::<BookPatch>(br#"{"isbn": "abc"}"#).unwrap_err()).starts_with("the body contains incorrect JSON type"));
    }

    #[test]
    fn ids_below_one_are_not_found() {
        assert_eq!(parse_id("12").unwrap(), 12);
        for raw in ["0", "-3", "abc", ""] {
            assert_eq!(parse_id(raw).unwrap_err().status_code(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn expected_version_header_is_optional() {
        let mut headers = HeaderMap::new();
        assert!(check_expected_version(&headers, 3).is_ok());

        headers.insert(EXPECTED_VERSION_HEADER, "3".parse().unwrap());
        assert!(check_expected_version(&headers, 3).is_ok());
        assert_eq!(check_expected_version(&headers, 4).unwrap_err().status_code(), StatusCode::CONFLICT);

        headers.insert(EXPECTED_VERSION_HEADER, "three".parse().unwrap());
        assert_eq!(check_expected_version(&headers, 3).unwrap_err().status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn list_request_defaults() {
        let (predicates, filter) = list_request::<Book>(&HashMap::new()).unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_size, 10);
        assert_eq!(filter.sort, "id");
        assert_eq!(predicates.len(), 3);
        assert!(predicates.iter().all(Predicate::is_noop));
    }

    #[test]
    fn list_request_rejects_bad_params() {
        let params: HashMap<String, String> = [
            ("page".to_string(), "two".to_string()),
            ("page_size".to_string(), "500".to_string()),
            ("sorting".to_string(), "-password".to_string()),
        ]
        .into_iter()
        .collect();

        let err = list_request::<Book>(&params).unwrap_err();
        let json = err.to_json();
        assert_eq!(json["error"]["page"], "must be an integer value");
        assert_eq!(json["error"]["page_size"], "must be a maximum of 100");
        assert_eq!(json["error"]["sorting"], "invalid sort value");
    }
}
