use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::query_builder::Param;
use crate::database::repository::Entity;
use crate::filter::SearchField;
use crate::validator::Validator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Entity for Comment {
    const TABLE: &'static str = "comments";
    const COLUMNS: &'static [&'static str] = &["id", "content", "author", "version", "created_at"];
    const SORT_SAFELIST: &'static [&'static str] = &["id", "author", "created_at"];
    const SEARCH_FIELDS: &'static [SearchField] = &[
        SearchField { param: "content", field: "content", expr: "\"content\"" },
        SearchField { param: "author", field: "author", expr: "\"author\"" },
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
            ("content", Param::Text(self.content.clone())),
            ("author", Param::Text(self.author.clone())),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewComment {
    pub content: String,
    pub author: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub author: Option<String>,
}

impl CommentPatch {
    pub fn apply(self, comment: &mut Comment) {
        if let Some(content) = self.content {
            comment.content = content;
        }
        if let Some(author) = self.author {
            comment.author = author;
        }
    }
}

pub fn validate_comment(v: &mut Validator, comment: &Comment) {
    v.check(!comment.content.is_empty(), "content", "must be provided");
    v.check(!comment.author.is_empty(), "author", "must be provided");
    v.check(comment.content.len() <= 100, "content", "must not be more than 100 bytes long");
    v.check(comment.author.len() <= 25, "author", "must not be more than 25 bytes long");
}
