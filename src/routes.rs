use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put, MethodRouter},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::permission::{BOOKS_READ, BOOKS_WRITE};
use crate::error::ApiError;
use crate::handlers::protected::{books, comments, reading_lists, reviews, users};
use crate::handlers::public;
use crate::middleware::{
    authenticate, handle_panic, method_not_allowed, rate_limit, require_activated_user, require_permission,
    PermissionGate,
};
use crate::state::AppState;

/// Requires an activated account.
fn activated(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(from_fn(require_activated_user))
}

/// Requires an activated account holding `code`.
fn permitted(state: &AppState, code: &'static str, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    let gate = PermissionGate::new(state.permissions.clone(), code);
    route
        .route_layer(from_fn_with_state(gate, require_permission))
        .route_layer(from_fn(require_activated_user))
}

async fn not_found() -> ApiError {
    ApiError::resource_not_found()
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_trusted_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !security.enable_cors || origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Public
        .route("/healthcheck", get(public::healthcheck))
        .route("/users", post(public::register_user))
        .route("/users/activated", put(public::activate_user))
        .route("/users/password", put(public::update_user_password))
        .route("/tokens/authentication", post(public::create_authentication_token))
        .route("/tokens/password-reset", post(public::create_password_reset_token))
        // Books
        .route(
            "/books",
            permitted(state, BOOKS_READ, get(books::list_books))
                .merge(permitted(state, BOOKS_WRITE, post(books::create_book))),
        )
        .route("/books/search", permitted(state, BOOKS_READ, get(books::list_books)))
        .route(
            "/books/:id",
            permitted(state, BOOKS_READ, get(books::show_book))
                .merge(permitted(state, BOOKS_WRITE, patch(books::update_book).delete(books::delete_book))),
        )
        // Reviews
        .route(
            "/books/:id/reviews",
            activated(get(reviews::list_book_reviews).post(reviews::create_review)),
        )
        .route(
            "/reviews/:id",
            activated(patch(reviews::update_review).delete(reviews::delete_review)),
        )
        // Reading lists
        .route(
            "/lists",
            activated(get(reading_lists::list_reading_lists).post(reading_lists::create_reading_list)),
        )
        .route(
            "/lists/:id",
            activated(
                get(reading_lists::show_reading_list)
                    .patch(reading_lists::update_reading_list)
                    .delete(reading_lists::delete_reading_list),
            ),
        )
        .route(
            "/lists/:id/books",
            activated(post(reading_lists::add_list_book).delete(reading_lists::remove_list_book)),
        )
        // Comments
        .route(
            "/comments",
            activated(get(comments::list_comments).post(comments::create_comment)),
        )
        .route(
            "/comments/:id",
            activated(
                get(comments::show_comment)
                    .patch(comments::update_comment)
                    .delete(comments::delete_comment),
            ),
        )
        // Users
        .route("/users/:id", activated(get(users::show_user)))
        .route("/users/:id/reviews", activated(get(users::list_user_reviews)))
        .route("/users/:id/lists", activated(get(users::list_user_reading_lists)))
}

/// The complete application: `/api/v1` routes wrapped, outermost first, in
/// panic recovery, request tracing, CORS, rate limiting and authentication.
///
/// Request tracing is only installed when `server.enable_request_logging` is set.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .nest("/api/v1", api_routes(&state))
        .fallback(not_found)
        .layer(from_fn(method_not_allowed))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.limiter.clone(), rate_limit))
        .layer(cors_layer(&state.config.security));

    if state.config.server.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %Uuid::new_v4(),
            )
        }));
    }

    router.layer(CatchPanicLayer::custom(handle_panic)).with_state(state)
}
