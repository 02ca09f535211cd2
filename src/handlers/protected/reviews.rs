// handlers/protected/reviews.rs - book reviews

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
};

use crate::auth::CurrentUser;
use crate::database::models::review::validate_review;
use crate::database::models::{NewReview, Review, ReviewPatch};
use crate::database::Store;
use crate::error::ApiError;
use crate::filter::Predicate;
use crate::handlers::utils::{check_expected_version, ensure_owner, list_request, parse_id, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validator::Validator;

/// GET /api/v1/books/:id/reviews - reviews of one book
pub async fn list_book_reviews(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let book_id = parse_id(&book_id)?;
    let (mut predicates, filter) = list_request::<Review>(&params)?;
    if !state.books.exists(book_id).await? {
        return Err(ApiError::resource_not_found());
    }

    predicates.push(Predicate::equals("book_id", book_id));
    let (reviews, metadata) = state.reviews.list(&predicates, &filter).await?;
    Ok(ApiResponse::envelope("reviews", reviews).with("metadata", metadata))
}

/// POST /api/v1/books/:id/reviews - review a book as the current user
pub async fn create_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(book_id): Path<String>,
    JsonBody(input): JsonBody<NewReview>,
) -> ApiResult {
    let book_id = parse_id(&book_id)?;

    let review = Review {
        book_id,
        user_id: user.0.id,
        rating: input.rating,
        review_text: input.review_text,
        ..Review::default()
    };
    let mut v = Validator::new();
    validate_review(&mut v, &review);
    if !v.is_valid() {
        return Err(v.into());
    }

    if !state.books.exists(book_id).await? {
        return Err(ApiError::resource_not_found());
    }

    let review = state.reviews.insert(&review).await?;
    Ok(ApiResponse::envelope("review", &review).created(AppState::location("reviews", review.id)))
}

/// PATCH /api/v1/reviews/:id - edit one of the caller's reviews
pub async fn update_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    JsonBody(patch): JsonBody<ReviewPatch>,
) -> ApiResult {
    let mut review = state.reviews.get(parse_id(&id)?).await?;
    ensure_owner(&user, review.user_id)?;
    check_expected_version(&headers, review.version)?;

    patch.apply(&mut review);
    let mut v = Validator::new();
    validate_review(&mut v, &review);
    if !v.is_valid() {
        return Err(v.into());
    }

    let review = state.reviews.update(&review).await?;
    Ok(ApiResponse::envelope("review", review))
}

/// DELETE /api/v1/reviews/:id
pub async fn delete_review(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> ApiResult {
    let review = state.reviews.get(parse_id(&id)?).await?;
    ensure_owner(&user, review.user_id)?;

    state.reviews.delete(review.id).await?;
    Ok(ApiResponse::message("review successfully deleted"))
}
