use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::query_builder::Param;
use crate::database::repository::Entity;
use crate::filter::SearchField;
use crate::validator::Validator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub rating: f32,
    pub review_text: String,
    pub helpful_count: i32,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Entity for Review {
    const TABLE: &'static str = "reviews";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "book_id",
        "user_id",
        "rating",
        "review_text",
        "helpful_count",
        "version",
        "created_at",
    ];
    const SORT_SAFELIST: &'static [&'static str] = &["id", "rating", "helpful_count", "created_at"];
    const SEARCH_FIELDS: &'static [SearchField] = &[SearchField {
        param: "review_text",
        field: "review_text",
        expr: "\"review_text\"",
    }];

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
            ("book_id", Param::BigInt(self.book_id)),
            ("user_id", Param::BigInt(self.user_id)),
            ("rating", Param::Real(self.rating)),
            ("review_text", Param::Text(self.review_text.clone())),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewReview {
    pub rating: f32,
    pub review_text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewPatch {
    pub rating: Option<f32>,
    pub review_text: Option<String>,
}

impl ReviewPatch {
    pub fn apply(self, review: &mut Review) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(text) = self.review_text {
            review.review_text = text;
        }
    }
}

pub fn validate_review(v: &mut Validator, review: &Review) {
    v.check((1.0..=5.0).contains(&review.rating), "rating", "must be between 1 and 5");
    v.check(!review.review_text.is_empty(), "review_text", "must be provided");
    v.check(review.review_text.len() <= 100, "review_text", "must not be more than 100 bytes long");
}
