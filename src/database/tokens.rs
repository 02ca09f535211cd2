use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Scope, Token, User};

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: &Token) -> Result<(), DatabaseError>;

    /// Owner of a live token with this hash and scope.
    async fn user_for_token(&self, scope: Scope, hash: &[u8], now: DateTime<Utc>) -> Result<User, DatabaseError>;

    async fn delete_all_for_user(&self, scope: Scope, user_id: i64) -> Result<(), DatabaseError>;
}

pub struct PgTokenStore {
    db: DatabaseManager,
}

impl PgTokenStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(&self, token: &Token) -> Result<(), DatabaseError> {
        let query = sqlx::query(
            "INSERT INTO tokens (hash, user_id, expiry, scope) VALUES ($1, $2, $3, $4)",
        )
        .bind(token.hash.clone())
        .bind(token.user_id)
        .bind(token.expiry)
        .bind(token.scope.as_str());

        self.db.run(query.execute(self.db.pool())).await?;
        Ok(())
    }

    async fn user_for_token(&self, scope: Scope, hash: &[u8], now: DateTime<Utc>) -> Result<User, DatabaseError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT users.id, users.username, users.email, users.password_hash,
                   users.activated, users.version, users.created_at
            FROM users
            INNER JOIN tokens ON users.id = tokens.user_id
            WHERE tokens.hash = $1
              AND tokens.scope = $2
              AND tokens.expiry > $3
            "#,
        )
        .bind(hash)
        .bind(scope.as_str())
        .bind(now);

        self.db
            .run(query.fetch_optional(self.db.pool()))
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    async fn delete_all_for_user(&self, scope: Scope, user_id: i64) -> Result<(), DatabaseError> {
        let query = sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
            .bind(scope.as_str())
            .bind(user_id);

        self.db.run(query.execute(self.db.pool())).await?;
        Ok(())
    }
}
