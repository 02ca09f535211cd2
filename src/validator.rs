use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::hash::Hash;

/// Loose RFC 5322 shaped address check used for registration and lookups.
pub static EMAIL_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex should be valid")
});

/// Accumulates field-keyed error messages for a single request.
///
/// The first message recorded for a key wins; later ones are ignored.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(key.into()).or_insert_with(|| message.into());
    }

    /// Records `message` under `key` when `ok` is false.
    pub fn check(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_error(key, message);
        }
    }

    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    pub fn into_errors(self) -> HashMap<String, String> {
        self.errors
    }
}

pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = std::collections::HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_per_key_wins() {
        let mut v = Validator::new();
        v.add_error("title", "must be provided");
        v.add_error("title", "must not be more than 100 bytes long");
        assert_eq!(v.errors()["title"], "must be provided");
        assert!(!v.is_valid());
    }

    #[test]
    fn check_records_only_failures() {
        let mut v = Validator::new();
        v.check(true, "page", "must be greater than zero");
        assert!(v.is_valid());
        v.check(false, "page", "must be greater than zero");
        assert_eq!(v.into_errors().len(), 1);
    }

    #[test]
    fn email_pattern() {
        assert!(matches("reader@example.com", &EMAIL_RX));
        assert!(!matches("reader@", &EMAIL_RX));
        assert!(!matches("not an email", &EMAIL_RX));
    }

    #[test]
    fn unique_and_permitted() {
        assert!(unique(&["a", "b"]));
        assert!(!unique(&["a", "a"]));
        assert!(permitted_value(&"id", &["id", "title"]));
        assert!(!permitted_value(&"isbn", &["id", "title"]));
    }
}
