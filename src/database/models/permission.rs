pub const BOOKS_READ: &str = "books:read";
pub const BOOKS_WRITE: &str = "books:write";

/// Permission codes granted to new accounts.
pub const DEFAULT_GRANTS: &[&str] = &[BOOKS_READ];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(pub Vec<String>);

impl Permissions {
    pub fn includes(&self, code: &str) -> bool {
        self.0.iter().any(|c| c == code)
    }
}
