use async_trait::async_trait;
use serde::Serialize;
use sqlx::{self, postgres::PgRow, FromRow, Row};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::query_builder::{Param, SqlBuilder};
use crate::filter::{Filter, Metadata, Predicate, SearchField};

/// A versioned table-backed record.
///
/// Implementors supply only their field mapping; paging, search, optimistic
/// updates and deletes are shared by every store.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Serialize + Clone + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    /// Columns read back from the table, in `FromRow` order.
    const COLUMNS: &'static [&'static str];
    /// Keys accepted by the `sorting` query parameter, without the `-` prefix.
    const SORT_SAFELIST: &'static [&'static str];
    const SEARCH_FIELDS: &'static [SearchField] = &[];

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    fn version(&self) -> i32;
    fn set_version(&mut self, version: i32);

    /// Client-writable columns and their current values.
    fn fields(&self) -> Vec<(&'static str, Param)>;
}

/// CRUD and listing for one entity type.
#[async_trait]
pub trait Store<T: Entity>: Send + Sync {
    /// Persists a new record and returns it with server-assigned fields.
    async fn insert(&self, record: &T) -> Result<T, DatabaseError>;

    async fn get(&self, id: i64) -> Result<T, DatabaseError>;

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn list(&self, predicates: &[Predicate], filter: &Filter) -> Result<(Vec<T>, Metadata), DatabaseError>;

    /// Writes `record` if its version is still current.
    ///
    /// Fails with [`DatabaseError::EditConflict`] when another writer got
    /// there first and [`DatabaseError::NotFound`] when the row is gone.
    async fn update(&self, record: &T) -> Result<T, DatabaseError>;

    async fn delete(&self, id: i64) -> Result<(), DatabaseError>;
}

pub struct PgRepository<T> {
    db: DatabaseManager,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> PgRepository<T> {
    pub fn new(db: DatabaseManager) -> Self {
        Self {
            db,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseManager {
        &self.db
    }
}

#[async_trait]
impl<T: Entity> Store<T> for PgRepository<T> {
    async fn insert(&self, record: &T) -> Result<T, DatabaseError> {
        let mut qb = SqlBuilder::insert(T::TABLE, T::COLUMNS, record.fields());
        self.db.log_query(qb.sql());
        self.db.run(qb.build_query_as::<T>().fetch_one(self.db.pool())).await
    }

    async fn get(&self, id: i64) -> Result<T, DatabaseError> {
        if id < 1 {
            return Err(DatabaseError::NotFound);
        }
        let mut qb = SqlBuilder::select_by_id(T::TABLE, T::COLUMNS, id);
        self.db
            .run(qb.build_query_as::<T>().fetch_optional(self.db.pool()))
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        if id < 1 {
            return Ok(false);
        }
        let mut qb = SqlBuilder::exists(T::TABLE, id);
        self.db.run(qb.build_query_scalar::<bool>().fetch_one(self.db.pool())).await
    }

    async fn list(&self, predicates: &[Predicate], filter: &Filter) -> Result<(Vec<T>, Metadata), DatabaseError> {
        let mut qb = SqlBuilder::list(T::TABLE, T::COLUMNS, predicates, filter)?;
        self.db.log_query(qb.sql());
        let rows = self.db.run(qb.build().fetch_all(self.db.pool())).await?;

        let mut total_records = 0;
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            total_records = row.try_get::<i64, _>("total_records")?;
            records.push(T::from_row(row)?);
        }

        Ok((records, filter.metadata(total_records)))
    }

    async fn update(&self, record: &T) -> Result<T, DatabaseError> {
        let mut qb = SqlBuilder::update(T::TABLE, T::COLUMNS, record.fields(), record.id(), record.version());
        self.db.log_query(qb.sql());
        let updated = self
            .db
            .run(qb.build_query_as::<T>().fetch_optional(self.db.pool()))
            .await?;

        match updated {
            Some(row) => Ok(row),
            None if self.exists(record.id()).await? => Err(DatabaseError::EditConflict),
            None => Err(DatabaseError::NotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        if id < 1 {
            return Err(DatabaseError::NotFound);
        }
        let mut qb = SqlBuilder::delete(T::TABLE, id);
        let result = self.db.run(qb.build().execute(self.db.pool())).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
