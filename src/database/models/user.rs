use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::query_builder::Param;
use crate::database::repository::Entity;
use crate::validator::{matches, Validator, EMAIL_RX};

/// Registered account. The password hash is never serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub activated: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] =
        &["id", "username", "email", "password_hash", "activated", "version", "created_at"];
    const SORT_SAFELIST: &'static [&'static str] = &["id"];

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
            ("username", Param::Text(self.username.clone())),
            ("email", Param::Text(self.email.clone())),
            ("password_hash", Param::Text(self.password_hash.clone())),
            ("activated", Param::Bool(self.activated)),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(matches(email, &EMAIL_RX), "email", "must be a valid email address");
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(password.len() >= 8, "password", "must be at least 8 bytes long");
    v.check(password.len() <= 72, "password", "must not be more than 72 bytes long");
}

pub fn validate_user(v: &mut Validator, input: &NewUser) {
    v.check(!input.username.is_empty(), "username", "must be provided");
    v.check(input.username.len() <= 200, "username", "must not be more than 200 bytes long");
    validate_email(v, &input.email);
    validate_password_plaintext(v, &input.password);
}
