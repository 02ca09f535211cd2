use async_trait::async_trait;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Permissions;

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions, DatabaseError>;

    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> Result<(), DatabaseError>;
}

pub struct PgPermissionStore {
    db: DatabaseManager,
}

impl PgPermissionStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PermissionStore for PgPermissionStore {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions, DatabaseError> {
        let query = sqlx::query_scalar::<_, String>(
            r#"
            SELECT permissions.code
            FROM permissions
            INNER JOIN users_permissions ON users_permissions.permission_id = permissions.id
            WHERE users_permissions.user_id = $1
            "#,
        )
        .bind(user_id);

        let codes = self.db.run(query.fetch_all(self.db.pool())).await?;
        Ok(Permissions(codes))
    }

    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> Result<(), DatabaseError> {
        let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
        let query = sqlx::query(
            r#"
            INSERT INTO users_permissions (user_id, permission_id)
            SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(codes);

        self.db.run(query.execute(self.db.pool())).await?;
        Ok(())
    }
}
