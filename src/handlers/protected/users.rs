// handlers/protected/users.rs - public profiles and per-user listings

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use serde::Serialize;

use crate::database::models::{ReadingList, Review, User};
use crate::database::Store;
use crate::error::ApiError;
use crate::filter::Predicate;
use crate::handlers::utils::{list_request, parse_id};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// What other users may see of an account.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub activated: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            activated: user.activated,
            created_at: user.created_at,
        }
    }
}

/// GET /api/v1/users/:id
pub async fn show_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let user = state.users.get(parse_id(&id)?).await?;
    Ok(ApiResponse::envelope("user", Profile::from(user)))
}

/// GET /api/v1/users/:id/reviews
pub async fn list_user_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let user_id = parse_id(&id)?;
    let (mut predicates, filter) = list_request::<Review>(&params)?;
    if !state.users.exists(user_id).await? {
        return Err(ApiError::resource_not_found());
    }

    predicates.push(Predicate::equals("user_id", user_id));
    let (reviews, metadata) = state.reviews.list(&predicates, &filter).await?;
    Ok(ApiResponse::envelope("reviews", reviews).with("metadata", metadata))
}

/// GET /api/v1/users/:id/lists
pub async fn list_user_reading_lists(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let user_id = parse_id(&id)?;
    let (mut predicates, filter) = list_request::<ReadingList>(&params)?;
    if !state.users.exists(user_id).await? {
        return Err(ApiError::resource_not_found());
    }

    predicates.push(Predicate::equals("created_by", user_id));
    let (lists, metadata) = state.lists.list(&predicates, &filter).await?;
    Ok(ApiResponse::envelope("reading_lists", lists).with("metadata", metadata))
}
