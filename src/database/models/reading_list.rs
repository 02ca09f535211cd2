use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::query_builder::Param;
use crate::database::repository::Entity;
use crate::filter::SearchField;
use crate::validator::{permitted_value, Validator};

pub const READING_STATUSES: &[&str] = &["want_to_read", "currently_reading", "completed"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct ReadingList {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_by: i64,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Entity for ReadingList {
    const TABLE: &'static str = "reading_lists";
    const COLUMNS: &'static [&'static str] = &["id", "name", "description", "created_by", "version", "created_at"];
    const SORT_SAFELIST: &'static [&'static str] = &["id", "name", "created_at"];
    const SEARCH_FIELDS: &'static [SearchField] = &[
        SearchField { param: "name", field: "name", expr: "\"name\"" },
        SearchField { param: "description", field: "description", expr: "\"description\"" },
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
            ("name", Param::Text(self.name.clone())),
            ("description", Param::Text(self.description.clone())),
            ("created_by", Param::BigInt(self.created_by)),
        ]
    }
}

/// A book placed on a reading list.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ListEntry {
    pub reading_list_id: i64,
    pub book_id: i64,
    pub status: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewReadingList {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadingListPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ReadingListPatch {
    pub fn apply(self, list: &mut ReadingList) {
        if let Some(name) = self.name {
            list.name = name;
        }
        if let Some(description) = self.description {
            list.description = description;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewListEntry {
    pub book_id: i64,
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListEntryRef {
    pub book_id: i64,
}

pub fn validate_reading_list(v: &mut Validator, list: &ReadingList) {
    v.check(!list.name.is_empty(), "name", "must be provided");
    v.check(list.name.len() <= 25, "name", "must not be more than 25 bytes long");
    v.check(!list.description.is_empty(), "description", "must be provided");
    v.check(list.description.len() <= 250, "description", "must not be more than 250 bytes long");
}

pub fn validate_list_entry(v: &mut Validator, entry: &NewListEntry) {
    v.check(entry.book_id > 0, "book_id", "must be a positive integer");
    v.check(
        permitted_value(&entry.status.as_str(), READING_STATUSES),
        "status",
        "must be one of want_to_read, currently_reading or completed",
    );
}
