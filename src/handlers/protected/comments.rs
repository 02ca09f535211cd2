// handlers/protected/comments.rs - /api/v1/comments

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
};

use crate::database::models::comment::validate_comment;
use crate::database::models::{Comment, CommentPatch, NewComment};
use crate::database::Store;
use crate::handlers::utils::{check_expected_version, list_request, parse_id, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validator::Validator;

/// GET /api/v1/comments - page through comments, searching `content` and `author`
pub async fn list_comments(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> ApiResult {
    let (predicates, filter) = list_request::<Comment>(&params)?;
    let (comments, metadata) = state.comments.list(&predicates, &filter).await?;
    Ok(ApiResponse::envelope("comments", comments).with("metadata", metadata))
}

/// GET /api/v1/comments/:id
pub async fn show_comment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let comment = state.comments.get(parse_id(&id)?).await?;
    Ok(ApiResponse::envelope("comment", comment))
}

/// POST /api/v1/comments
pub async fn create_comment(State(state): State<AppState>, JsonBody(input): JsonBody<NewComment>) -> ApiResult {
    let comment = Comment {
        content: input.content,
        author: input.author,
        ..Comment::default()
    };
    let mut v = Validator::new();
    validate_comment(&mut v, &comment);
    if !v.is_valid() {
        return Err(v.into());
    }

    let comment = state.comments.insert(&comment).await?;
    Ok(ApiResponse::envelope("comment", &comment).created(AppState::location("comments", comment.id)))
}

/// PATCH /api/v1/comments/:id
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    JsonBody(patch): JsonBody<CommentPatch>,
) -> ApiResult {
    let mut comment = state.comments.get(parse_id(&id)?).await?;
    check_expected_version(&headers, comment.version)?;

    patch.apply(&mut comment);
    let mut v = Validator::new();
    validate_comment(&mut v, &comment);
    if !v.is_valid() {
        return Err(v.into());
    }

    let comment = state.comments.update(&comment).await?;
    Ok(ApiResponse::envelope("comment", comment))
}

/// DELETE /api/v1/comments/:id
pub async fn delete_comment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.comments.delete(parse_id(&id)?).await?;
    Ok(ApiResponse::message("comment successfully deleted"))
}
