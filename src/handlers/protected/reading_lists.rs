// handlers/protected/reading_lists.rs - reading lists and their books

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
};

use crate::auth::CurrentUser;
use crate::database::models::reading_list::{validate_list_entry, validate_reading_list, ListEntryRef};
use crate::database::models::{NewListEntry, NewReadingList, ReadingList, ReadingListPatch};
use crate::database::{DatabaseError, Store};
use crate::error::ApiError;
use crate::handlers::utils::{check_expected_version, ensure_owner, list_request, parse_id, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validator::Validator;

/// GET /api/v1/lists - page through reading lists, searching `name` and `description`
pub async fn list_reading_lists(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let (predicates, filter) = list_request::<ReadingList>(&params)?;
    let (lists, metadata) = state.lists.list(&predicates, &filter).await?;
    Ok(ApiResponse::envelope("reading_lists", lists).with("metadata", metadata))
}

/// GET /api/v1/lists/:id - a list together with its books
pub async fn show_reading_list(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let list = state.lists.get(parse_id(&id)?).await?;
    let books = state.list_books.entries(list.id).await?;
    Ok(ApiResponse::envelope("reading_list", list).with("books", books))
}

/// POST /api/v1/lists - the caller becomes the list's owner
pub async fn create_reading_list(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(input): JsonBody<NewReadingList>,
) -> ApiResult {
    let list = ReadingList {
        name: input.name,
        description: input.description,
        created_by: user.0.id,
        ..ReadingList::default()
    };
    let mut v = Validator::new();
    validate_reading_list(&mut v, &list);
    if !v.is_valid() {
        return Err(v.into());
    }

    let list = state.lists.insert(&list).await?;
    Ok(ApiResponse::envelope("reading_list", &list).created(AppState::location("lists", list.id)))
}

/// PATCH /api/v1/lists/:id
pub async fn update_reading_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    JsonBody(patch): JsonBody<ReadingListPatch>,
) -> ApiResult {
    let mut list = state.lists.get(parse_id(&id)?).await?;
    ensure_owner(&user, list.created_by)?;
    check_expected_version(&headers, list.version)?;

    patch.apply(&mut list);
    let mut v = Validator::new();
    validate_reading_list(&mut v, &list);
    if !v.is_valid() {
        return Err(v.into());
    }

    let list = state.lists.update(&list).await?;
    Ok(ApiResponse::envelope("reading_list", list))
}

/// DELETE /api/v1/lists/:id
pub async fn delete_reading_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult {
    let list = state.lists.get(parse_id(&id)?).await?;
    ensure_owner(&user, list.created_by)?;

    state.lists.delete(list.id).await?;
    Ok(ApiResponse::message("reading list successfully deleted"))
}

/// POST /api/v1/lists/:id/books - put an existing book on one of the caller's lists
pub async fn add_list_book(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<NewListEntry>,
) -> ApiResult {
    let list_id = parse_id(&id)?;
    let mut v = Validator::new();
    validate_list_entry(&mut v, &input);
    if !v.is_valid() {
        return Err(v.into());
    }

    let list = state.lists.get(list_id).await?;
    ensure_owner(&user, list.created_by)?;
    if !state.books.exists(input.book_id).await? {
        return Err(ApiError::resource_not_found());
    }

    let entry = match state.list_books.add(list.id, input.book_id, &input.status).await {
        Err(DatabaseError::Conflict(_)) => {
            return Err(ApiError::field("book_id", "this book is already on the reading list"));
        }
        result => result?,
    };

    Ok(ApiResponse::envelope("entry", entry).created(AppState::location("lists", list.id)))
}

/// DELETE /api/v1/lists/:id/books - take a book off one of the caller's lists
pub async fn remove_list_book(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ListEntryRef>,
) -> ApiResult {
    let list = state.lists.get(parse_id(&id)?).await?;
    ensure_owner(&user, list.created_by)?;

    state.list_books.remove(list.id, input.book_id).await?;
    Ok(ApiResponse::message("book successfully removed from the reading list"))
}
