use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("unsafe sort parameter: {0}")]
    UnsafeSort(String),

    #[error("invalid column name: {0}")]
    InvalidColumn(String),
}
