use async_trait::async_trait;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::ListEntry;

/// Books placed on reading lists, keyed by `(reading_list_id, book_id)`.
#[async_trait]
pub trait ListBookStore: Send + Sync {
    /// Fails with [`DatabaseError::Conflict`] if the book is already on the list.
    async fn add(&self, reading_list_id: i64, book_id: i64, status: &str) -> Result<ListEntry, DatabaseError>;

    async fn remove(&self, reading_list_id: i64, book_id: i64) -> Result<(), DatabaseError>;

    async fn entries(&self, reading_list_id: i64) -> Result<Vec<ListEntry>, DatabaseError>;
}

pub struct PgListBookStore {
    db: DatabaseManager,
}

impl PgListBookStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ListBookStore for PgListBookStore {
    async fn add(&self, reading_list_id: i64, book_id: i64, status: &str) -> Result<ListEntry, DatabaseError> {
        let query = sqlx::query_as::<_, ListEntry>(
            r#"
            INSERT INTO reading_list_books (reading_list_id, book_id, status)
            VALUES ($1, $2, $3)
            RETURNING reading_list_id, book_id, status, added_at
            "#,
        )
        .bind(reading_list_id)
        .bind(book_id)
        .bind(status.to_string());

        self.db.run(query.fetch_one(self.db.pool())).await
    }

    async fn remove(&self, reading_list_id: i64, book_id: i64) -> Result<(), DatabaseError> {
        let query = sqlx::query("DELETE FROM reading_list_books WHERE reading_list_id = $1 AND book_id = $2")
            .bind(reading_list_id)
            .bind(book_id);

        let result = self.db.run(query.execute(self.db.pool())).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn entries(&self, reading_list_id: i64) -> Result<Vec<ListEntry>, DatabaseError> {
        let query = sqlx::query_as::<_, ListEntry>(
            r#"
            SELECT reading_list_id, book_id, status, added_at
            FROM reading_list_books
            WHERE reading_list_id = $1
            ORDER BY added_at ASC, book_id ASC
            "#,
        )
        .bind(reading_list_id);

        self.db.run(query.fetch_all(self.db.pool())).await
    }
}
