use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::User;
use crate::database::query_builder::SqlBuilder;
use crate::database::repository::{Entity, PgRepository, Store};

/// User accounts. Inserting or updating onto an existing email fails with
/// [`DatabaseError::Conflict`].
#[async_trait]
pub trait UserStore: Store<User> {
    async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError>;
}

#[async_trait]
impl UserStore for PgRepository<User> {
    async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        let mut qb = SqlBuilder::select_where(User::TABLE, User::COLUMNS, "email");
        qb.push_bind(email.to_string());
        self.db()
            .run(qb.build_query_as::<User>().fetch_optional(self.db().pool()))
            .await?
            .ok_or(DatabaseError::NotFound)
    }
}
