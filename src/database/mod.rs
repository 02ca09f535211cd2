pub mod list_books;
pub mod manager;
pub mod models;
pub mod permissions;
pub mod query_builder;
pub mod repository;
pub mod tokens;
pub mod users;

pub use list_books::{ListBookStore, PgListBookStore};
pub use manager::{DatabaseError, DatabaseManager};
pub use permissions::{PermissionStore, PgPermissionStore};
pub use repository::{Entity, PgRepository, Store};
pub use tokens::{PgTokenStore, TokenStore};
pub use users::UserStore;
