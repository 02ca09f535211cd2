use super::error::FilterError;
use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    /// Renders `ORDER BY <col> <dir>, "id" ASC`.
    ///
    /// The id tiebreaker keeps page boundaries stable when the primary key ties.
    pub fn generate(info: &FilterOrderInfo) -> Result<String, FilterError> {
        Self::validate_column(&info.column)?;
        Ok(format!("ORDER BY \"{}\" {}, \"id\" ASC", info.column, info.sort.to_sql()))
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        let valid = !column.is_empty()
            && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !column.starts_with(|c: char| c.is_ascii_digit());
        if valid {
            Ok(())
        } else {
            Err(FilterError::InvalidColumn(column.to_string()))
        }
    }
}
