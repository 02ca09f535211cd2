use super::error::FilterError;
use super::types::{FilterOrderInfo, Metadata, SortDirection};
use crate::validator::{permitted_value, Validator};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_SORT: &str = "id";
pub const MAX_PAGE: i64 = 500;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination and ordering requested for a list query.
///
/// A filter must pass [`Filter::validate`] before it reaches a store. Stores
/// still refuse unsafe sort keys through [`Filter::order`], which never falls
/// back to a default column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Filter {
    pub fn new(page: i64, page_size: i64, sort: impl Into<String>, sort_safelist: &'static [&'static str]) -> Self {
        Self {
            page,
            page_size,
            sort: sort.into(),
            sort_safelist,
        }
    }

    /// Default first page ordered by id.
    pub fn first_page(sort_safelist: &'static [&'static str]) -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_SORT, sort_safelist)
    }

    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(self.page <= MAX_PAGE, "page", "must be a maximum of 500");
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(self.page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");
        v.check(self.is_safe_sort(), "sorting", "invalid sort value");
    }

    fn is_safe_sort(&self) -> bool {
        let column = self.sort.strip_prefix('-').unwrap_or(&self.sort);
        permitted_value(&column, self.sort_safelist)
    }

    pub fn sort_column(&self) -> Result<&str, FilterError> {
        let column = self.sort.strip_prefix('-').unwrap_or(&self.sort);
        if permitted_value(&column, self.sort_safelist) {
            Ok(column)
        } else {
            Err(FilterError::UnsafeSort(self.sort.clone()))
        }
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with('-') {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn order(&self) -> Result<FilterOrderInfo, FilterError> {
        Ok(FilterOrderInfo {
            column: self.sort_column()?.to_string(),
            sort: self.sort_direction(),
        })
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub fn metadata(&self, total_records: i64) -> Metadata {
        Metadata::calculate(total_records, self.page, self.page_size)
    }
}
