// handlers/protected/books.rs - /api/v1/books

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
};

use crate::database::models::book::validate_book;
use crate::database::models::{Book, BookPatch, NewBook};
use crate::database::Store;
use crate::handlers::utils::{check_expected_version, list_request, parse_id, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validator::Validator;

/// GET /api/v1/books - page through books, optionally searching `title`, `author` and `genre`
///
/// Also mounted at `/api/v1/books/search`.
pub async fn list_books(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> ApiResult {
    let (predicates, filter) = list_request::<Book>(&params)?;
    let (books, metadata) = state.books.list(&predicates, &filter).await?;
    Ok(ApiResponse::envelope("books", books).with("metadata", metadata))
}

/// GET /api/v1/books/:id
pub async fn show_book(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let book = state.books.get(parse_id(&id)?).await?;
    Ok(ApiResponse::envelope("book", book))
}

/// POST /api/v1/books
pub async fn create_book(State(state): State<AppState>, JsonBody(input): JsonBody<NewBook>) -> ApiResult {
    let mut v = Validator::new();
    let Some(book) = input.into_book(&mut v) else {
        return Err(v.into());
    };

    let book = state.books.insert(&book).await?;
    tracing::info!(book_id = book.id, "book created");
    Ok(ApiResponse::envelope("book", &book).created(AppState::location("books", book.id)))
}

/// PATCH /api/v1/books/:id - apply the keys present in the body
///
/// The write is conditioned on the version read here, so a concurrent edit
/// between read and write yields 409 rather than a lost update.
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    JsonBody(patch): JsonBody<BookPatch>,
) -> ApiResult {
    let mut book = state.books.get(parse_id(&id)?).await?;
    check_expected_version(&headers, book.version)?;

    patch.apply(&mut book);
    let mut v = Validator::new();
    validate_book(&mut v, &book);
    if !v.is_valid() {
        return Err(v.into());
    }

    let book = state.books.update(&book).await?;
    Ok(ApiResponse::envelope("book", book))
}

/// DELETE /api/v1/books/:id
pub async fn delete_book(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.books.delete(parse_id(&id)?).await?;
    Ok(ApiResponse::message("book successfully deleted"))
}
