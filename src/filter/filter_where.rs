use sqlx::{Postgres, QueryBuilder};

use super::error::FilterError;
use super::types::Predicate;

pub struct FilterWhere;

impl FilterWhere {
    /// Appends a `WHERE` clause for the predicates that can exclude rows.
    ///
    /// Search terms are bound as parameters; only trusted column names and
    /// expressions are interpolated.
    pub fn push<'args>(qb: &mut QueryBuilder<'args, Postgres>, predicates: &[Predicate]) -> Result<(), FilterError> {
        let mut first = true;
        for predicate in predicates.iter().filter(|p| !p.is_noop()) {
            qb.push(if first { " WHERE " } else { " AND " });
            first = false;

            match predicate {
                Predicate::Search { field, term } => {
                    qb.push("to_tsvector('simple', ")
                        .push(field.expr)
                        .push(") @@ plainto_tsquery('simple', ")
                        .push_bind(term.clone())
                        .push(")");
                }
                Predicate::Equals { column, value } => {
                    if !column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        return Err(FilterError::InvalidColumn(column.to_string()));
                    }
                    qb.push(format!("\"{}\" = ", column)).push_bind(*value);
                }
            }
        }
        Ok(())
    }
}
