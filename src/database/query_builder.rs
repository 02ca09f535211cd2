use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};

use crate::filter::filter_order::FilterOrder;
use crate::filter::filter_where::FilterWhere;
use crate::filter::{Filter, FilterError, Predicate};

/// A column value written by insert and update statements.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    BigInt(i64),
    Int(i32),
    Real(f32),
    Bool(bool),
    Text(String),
    TextArray(Vec<String>),
    Date(NaiveDate),
}

fn push_param<'args>(qb: &mut QueryBuilder<'args, Postgres>, param: Param) {
    match param {
        Param::BigInt(v) => qb.push_bind(v),
        Param::Int(v) => qb.push_bind(v),
        Param::Real(v) => qb.push_bind(v),
        Param::Bool(v) => qb.push_bind(v),
        Param::Text(v) => qb.push_bind(v),
        Param::TextArray(v) => qb.push_bind(v),
        Param::Date(v) => qb.push_bind(v),
    };
}

fn column_list(columns: &[&str]) -> String {
    columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
}

/// SQL builders shared by every table-backed store.
///
/// Table and column names come from compile-time constants; values are always bound.
pub struct SqlBuilder;

impl SqlBuilder {
    pub fn insert<'args>(table: &str, returning: &[&str], fields: Vec<(&'static str, Param)>) -> QueryBuilder<'args, Postgres> {
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let mut qb = QueryBuilder::new(format!("INSERT INTO \"{}\" ({}) VALUES (", table, column_list(&names)));
        for (i, (_, value)) in fields.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_param(&mut qb, value);
        }
        qb.push(format!(") RETURNING {}", column_list(returning)));
        qb
    }

    /// Optimistic update: matches only the version the caller read, bumps it.
    pub fn update<'args>(
        table: &str,
        returning: &[&str],
        fields: Vec<(&'static str, Param)>,
        id: i64,
        version: i32,
    ) -> QueryBuilder<'args, Postgres> {
        let mut qb = QueryBuilder::new(format!("UPDATE \"{}\" SET ", table));
        for (name, value) in fields {
            qb.push(format!("\"{}\" = ", name));
            push_param(&mut qb, value);
            qb.push(", ");
        }
        qb.push("\"version\" = \"version\" + 1 WHERE \"id\" = ")
            .push_bind(id)
            .push(" AND \"version\" = ")
            .push_bind(version)
            .push(format!(" RETURNING {}", column_list(returning)));
        qb
    }

    /// Page query with the total row count carried as a window column.
    pub fn list<'args>(
        table: &str,
        columns: &[&str],
        predicates: &[Predicate],
        filter: &Filter,
    ) -> Result<QueryBuilder<'args, Postgres>, FilterError> {
        let order = FilterOrder::generate(&filter.order()?)?;

        let mut qb = QueryBuilder::new(format!(
            "SELECT COUNT(*) OVER() AS \"total_records\", {} FROM \"{}\"",
            column_list(columns),
            table
        ));
        FilterWhere::push(&mut qb, predicates)?;
        qb.push(" ")
            .push(order)
            .push(" LIMIT ")
            .push_bind(filter.limit())
            .push(" OFFSET ")
            .push_bind(filter.offset());
        Ok(qb)
    }

    /// `SELECT ... WHERE "<column>" = ` with the value left for the caller to bind.
    pub fn select_where<'args>(table: &str, columns: &[&str], column: &str) -> QueryBuilder<'args, Postgres> {
        QueryBuilder::new(format!(
            "SELECT {} FROM \"{}\" WHERE \"{}\" = ",
            column_list(columns),
            table,
            column
        ))
    }

    pub fn select_by_id<'args>(table: &str, columns: &[&str], id: i64) -> QueryBuilder<'args, Postgres> {
        let mut qb = Self::select_where(table, columns, "id");
        qb.push_bind(id);
        qb
    }

    pub fn exists<'args>(table: &str, id: i64) -> QueryBuilder<'args, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT EXISTS (SELECT 1 FROM \"{}\" WHERE \"id\" = ", table));
        qb.push_bind(id).push(")");
        qb
    }

    pub fn delete<'args>(table: &str, id: i64) -> QueryBuilder<'args, Postgres> {
        let mut qb = QueryBuilder::new(format!("DELETE FROM \"{}\" WHERE \"id\" = ", table));
        qb.push_bind(id);
        qb
    }
}
