use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::query_builder::Param;
use crate::database::repository::Entity;
use crate::filter::SearchField;
use crate::validator::{unique, Validator};

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub authors: Vec<String>,
    pub isbn: i64,
    pub publication_date: NaiveDate,
    pub genres: Vec<String>,
    pub description: String,
    pub average_rating: f32,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Entity for Book {
    const TABLE: &'static str = "books";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "authors",
        "isbn",
        "publication_date",
        "genres",
        "description",
        "average_rating",
        "version",
        "created_at",
    ];
    const SORT_SAFELIST: &'static [&'static str] = &["id", "title", "publication_date", "average_rating"];
    const SEARCH_FIELDS: &'static [SearchField] = &[
        SearchField { param: "title", field: "title", expr: "\"title\"" },
        SearchField { param: "author", field: "authors", expr: "array_to_string(\"authors\", ' ')" },
        SearchField { param: "genre", field: "genres", expr: "array_to_string(\"genres\", ' ')" },
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn fields(&self) -> Vec<(&'static str, Param)> {
        vec![
            ("title", Param::Text(self.title.clone())),
            ("authors", Param::TextArray(self.authors.clone())),
            ("isbn", Param::BigInt(self.isbn)),
            ("publication_date", Param::Date(self.publication_date)),
            ("genres", Param::TextArray(self.genres.clone())),
            ("description", Param::Text(self.description.clone())),
        ]
    }
}

/// Body of a create request. Missing keys surface as validation errors.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewBook {
    pub title: String,
    pub authors: Vec<String>,
    pub isbn: i64,
    pub publication_date: Option<NaiveDate>,
    pub genres: Vec<String>,
    pub description: String,
}

impl NewBook {
    /// Validates the input and builds an unsaved book from it.
    pub fn into_book(self, v: &mut Validator) -> Option<Book> {
        v.check(self.publication_date.is_some(), "publication_date", "must be provided");
        let book = Book {
            title: self.title,
            authors: self.authors,
            isbn: self.isbn,
            publication_date: self.publication_date.unwrap_or_default(),
            genres: self.genres,
            description: self.description,
            ..Book::default()
        };
        validate_book(v, &book);
        v.is_valid().then_some(book)
    }
}

/// Body of a partial update; only present keys are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookPatch {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub isbn: Option<i64>,
    pub publication_date: Option<NaiveDate>,
    pub genres: Option<Vec<String>>,
    pub description: Option<String>,
}

impl BookPatch {
    pub fn apply(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(authors) = self.authors {
            book.authors = authors;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
        if let Some(date) = self.publication_date {
            book.publication_date = date;
        }
        if let Some(genres) = self.genres {
            book.genres = genres;
        }
        if let Some(description) = self.description {
            book.description = description;
        }
    }
}

pub fn validate_book(v: &mut Validator, book: &Book) {
    v.check(!book.title.is_empty(), "title", "must be provided");
    v.check(book.title.len() <= 100, "title", "must not be more than 100 bytes long");

    v.check(!book.authors.is_empty(), "authors", "must contain at least 1 author");
    v.check(book.authors.iter().all(|a| !a.is_empty()), "authors", "must not contain empty values");
    v.check(book.authors.iter().all(|a| a.len() <= 25), "authors", "must not contain names longer than 25 bytes");
    v.check(unique(&book.authors), "authors", "must not contain duplicate values");

    v.check(book.isbn > 0, "isbn", "must be a positive integer");

    v.check(
        book.publication_date <= Utc::now().date_naive(),
        "publication_date",
        "must not be in the future",
    );

    v.check(!book.genres.is_empty(), "genres", "must contain at least 1 genre");
    v.check(book.genres.iter().all(|g| !g.is_empty()), "genres", "must not contain empty values");
    v.check(book.genres.iter().all(|g| g.len() <= 25), "genres", "must not contain genres longer than 25 bytes");
    v.check(unique(&book.genres), "genres", "must not contain duplicate values");

    v.check(!book.description.is_empty(), "description", "must be provided");
    v.check(book.description.len() <= 500, "description", "must not be more than 500 bytes long");
}
