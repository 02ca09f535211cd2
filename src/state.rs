use std::sync::Arc;

use crate::auth::TokenService;
use crate::background::BackgroundTasks;
use crate::config::AppConfig;
use crate::database::models::{Book, Comment, ReadingList, Review, User};
use crate::database::{
    DatabaseManager, ListBookStore, PermissionStore, PgListBookStore, PgPermissionStore, PgRepository, PgTokenStore,
    Store, UserStore,
};
use crate::middleware::RateLimiter;
use crate::notify::{LogNotifier, Notifier};

/// Everything a handler or middleware may reach. Stores are trait objects so
/// tests can swap in in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub books: Arc<dyn Store<Book>>,
    pub reviews: Arc<dyn Store<Review>>,
    pub lists: Arc<dyn Store<ReadingList>>,
    pub list_books: Arc<dyn ListBookStore>,
    pub comments: Arc<dyn Store<Comment>>,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub permissions: Arc<dyn PermissionStore>,
    pub limiter: Arc<RateLimiter>,
    pub background: BackgroundTasks,
    pub notifier: Arc<dyn Notifier>,
    pub db: Option<DatabaseManager>,
}

impl AppState {
    /// Postgres-backed state sharing one connection pool.
    pub fn postgres(config: AppConfig, db: DatabaseManager) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.limiter.clone()));
        Self {
            books: Arc::new(PgRepository::<Book>::new(db.clone())),
            reviews: Arc::new(PgRepository::<Review>::new(db.clone())),
            lists: Arc::new(PgRepository::<ReadingList>::new(db.clone())),
            list_books: Arc::new(PgListBookStore::new(db.clone())),
            comments: Arc::new(PgRepository::<Comment>::new(db.clone())),
            users: Arc::new(PgRepository::<User>::new(db.clone())),
            tokens: TokenService::new(Arc::new(PgTokenStore::new(db.clone()))),
            permissions: Arc::new(PgPermissionStore::new(db.clone())),
            limiter,
            background: BackgroundTasks::new(),
            notifier: Arc::new(LogNotifier),
            db: Some(db),
            config: Arc::new(config),
        }
    }

    /// `/api/v1/...` location of a resource.
    pub fn location(resource: &str, id: i64) -> String {
        format!("/api/v1/{}/{}", resource, id)
    }
}
