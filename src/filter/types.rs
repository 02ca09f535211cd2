use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// Page metadata returned alongside every list response.
///
/// All fields are zero when the result set is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 || page_size <= 0 {
            return Self::default();
        }
        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}

/// A searchable text field of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchField {
    /// Query string parameter carrying the search term.
    pub param: &'static str,
    /// Record field the term is matched against.
    pub field: &'static str,
    /// SQL text expression fed to the tokenizer.
    pub expr: &'static str,
}

/// A row predicate applied by list queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Full-text match; an empty term matches every row.
    Search { field: SearchField, term: String },
    /// Integer column equality, used for ownership and parent scoping.
    Equals { column: &'static str, value: i64 },
}

impl Predicate {
    pub fn search(field: SearchField, term: impl Into<String>) -> Self {
        Predicate::Search { field, term: term.into() }
    }

    pub fn equals(column: &'static str, value: i64) -> Self {
        Predicate::Equals { column, value }
    }

    /// True when the predicate cannot exclude any row.
    pub fn is_noop(&self) -> bool {
        matches!(self, Predicate::Search { term, .. } if term.trim().is_empty())
    }
}
