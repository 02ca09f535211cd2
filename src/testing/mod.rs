//! In-memory store doubles and a router harness for unit tests.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::{hash_password, TokenService};
use crate::background::BackgroundTasks;
use crate::config::AppConfig;
use crate::database::models::{ListEntry, Permissions, Scope, Token, User};
use crate::database::{DatabaseError, Entity, ListBookStore, PermissionStore, Store, TokenStore, UserStore};
use crate::filter::{Filter, Metadata, Predicate};
use crate::middleware::RateLimiter;
use crate::notify::{Notification, Notifier};
use crate::routes;
use crate::state::AppState;

fn field(record: &Value, name: &str) -> Value {
    record.get(name).cloned().unwrap_or(Value::Null)
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(text_of).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}

fn matches_predicate(record: &Value, predicate: &Predicate) -> bool {
    match predicate {
        _ if predicate.is_noop() => true,
        Predicate::Search { field: search, term } => {
            let haystack = words(&text_of(&field(record, search.field)));
            words(term).iter().all(|w| haystack.contains(w))
        }
        Predicate::Equals { column, value } => field(record, column).as_i64() == Some(*value),
    }
}

fn compare(a: &Value, b: &Value) -> CmpOrdering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal),
        _ => text_of(a).cmp(&text_of(b)),
    }
}

/// A table held in a map. Counts every call so tests can assert that
/// rejected requests never reached storage.
pub struct MemoryStore<T> {
    records: Mutex<BTreeMap<i64, T>>,
    next_id: AtomicI64,
    calls: AtomicUsize,
    unique_field: Option<&'static str>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            calls: AtomicUsize::new(0),
            unique_field: None,
        }
    }
}

impl<T: Entity> MemoryStore<T> {
    /// Rejects inserts and updates that would duplicate `field`.
    pub fn unique_on(field: &'static str) -> Self {
        Self { unique_field: Some(field), ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self, id: i64) -> Option<T> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    /// Stores `record` as-is, bypassing version bookkeeping.
    pub fn put(&self, record: T) {
        self.records.lock().unwrap().insert(record.id(), record);
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_unique(&self, records: &BTreeMap<i64, T>, record: &T) -> Result<(), DatabaseError> {
        let Some(name) = self.unique_field else {
            return Ok(());
        };
        let candidate = field(&serde_json::to_value(record).unwrap(), name);
        let clash = records.values().any(|existing| {
            existing.id() != record.id() && field(&serde_json::to_value(existing).unwrap(), name) == candidate
        });
        if clash {
            return Err(DatabaseError::Conflict(format!("{}_{}_key", T::TABLE, name)));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Store<T> for MemoryStore<T> {
    async fn insert(&self, record: &T) -> Result<T, DatabaseError> {
        self.touch();
        let mut records = self.records.lock().unwrap();
        let mut record = record.clone();
        record.set_id(self.next_id.fetch_add(1, Ordering::SeqCst));
        record.set_version(1);
        self.check_unique(&records, &record)?;
        records.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<T, DatabaseError> {
        self.touch();
        self.records.lock().unwrap().get(&id).cloned().ok_or(DatabaseError::NotFound)
    }

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        self.touch();
        Ok(self.records.lock().unwrap().contains_key(&id))
    }

    async fn list(&self, predicates: &[Predicate], filter: &Filter) -> Result<(Vec<T>, Metadata), DatabaseError> {
        self.touch();
        let order = filter.order()?;
        let records = self.records.lock().unwrap();

        let mut rows: Vec<(Value, T)> = records
            .values()
            .map(|r| (serde_json::to_value(r).unwrap(), r.clone()))
            .filter(|(json, _)| predicates.iter().all(|p| matches_predicate(json, p)))
            .collect();

        rows.sort_by(|(a, ra), (b, rb)| {
            let primary = compare(&field(a, &order.column), &field(b, &order.column));
            let primary = match order.sort {
                crate::filter::SortDirection::Asc => primary,
                crate::filter::SortDirection::Desc => primary.reverse(),
            };
            primary.then(ra.id().cmp(&rb.id()))
        });

        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .map(|(_, r)| r)
            .collect();
        Ok((page, filter.metadata(total)))
    }

    async fn update(&self, record: &T) -> Result<T, DatabaseError> {
        self.touch();
        let mut records = self.records.lock().unwrap();
        let current = records.get(&record.id()).ok_or(DatabaseError::NotFound)?;
        if current.version() != record.version() {
            return Err(DatabaseError::EditConflict);
        }
        self.check_unique(&records, record)?;
        let mut updated = record.clone();
        updated.set_version(record.version() + 1);
        records.insert(updated.id(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        self.touch();
        self.records.lock().unwrap().remove(&id).map(|_| ()).ok_or(DatabaseError::NotFound)
    }
}

#[async_trait]
impl UserStore for MemoryStore<User> {
    async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        self.touch();
        self.records
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }
}

pub struct MemoryTokenStore {
    users: Arc<MemoryStore<User>>,
    tokens: Mutex<Vec<Token>>,
}

impl MemoryTokenStore {
    pub fn new(users: Arc<MemoryStore<User>>) -> Self {
        Self { users, tokens: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn insert(&self, token: &Token) -> Result<(), DatabaseError> {
        self.tokens.lock().unwrap().push(token.clone());
        Ok(())
    }

    async fn user_for_token(&self, scope: Scope, hash: &[u8], now: DateTime<Utc>) -> Result<User, DatabaseError> {
        let user_id = self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.scope == scope && t.hash == hash && t.expiry > now)
            .map(|t| t.user_id)
            .ok_or(DatabaseError::NotFound)?;
        self.users.get(user_id).await
    }

    async fn delete_all_for_user(&self, scope: Scope, user_id: i64) -> Result<(), DatabaseError> {
        self.tokens
            .lock()
            .unwrap()
            .retain(|t| !(t.scope == scope && t.user_id == user_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPermissionStore {
    grants: Mutex<HashMap<i64, Vec<String>>>,
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions, DatabaseError> {
        Ok(Permissions(self.grants.lock().unwrap().get(&user_id).cloned().unwrap_or_default()))
    }

    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> Result<(), DatabaseError> {
        let mut grants = self.grants.lock().unwrap();
        let held = grants.entry(user_id).or_default();
        for code in codes {
            if !held.iter().any(|c| c == code) {
                held.push(code.to_string());
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryListBookStore {
    entries: Mutex<Vec<ListEntry>>,
}

#[async_trait]
impl ListBookStore for MemoryListBookStore {
    async fn add(&self, reading_list_id: i64, book_id: i64, status: &str) -> Result<ListEntry, DatabaseError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.reading_list_id == reading_list_id && e.book_id == book_id) {
            return Err(DatabaseError::Conflict("reading_list_books_pkey".into()));
        }
        let entry = ListEntry {
            reading_list_id,
            book_id,
            status: status.to_string(),
            added_at: Utc::now(),
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn remove(&self, reading_list_id: i64, book_id: i64) -> Result<(), DatabaseError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| !(e.reading_list_id == reading_list_id && e.book_id == book_id));
        if entries.len() == before {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn entries(&self, reading_list_id: i64) -> Result<Vec<ListEntry>, DatabaseError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.reading_list_id == reading_list_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Notification)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((recipient.to_string(), notification.clone()));
        Ok(())
    }
}

/// The real router wired to in-memory stores.
pub struct TestApp {
    pub state: AppState,
    pub books: Arc<MemoryStore<crate::database::models::Book>>,
    pub reviews: Arc<MemoryStore<crate::database::models::Review>>,
    pub lists: Arc<MemoryStore<crate::database::models::ReadingList>>,
    pub comments: Arc<MemoryStore<crate::database::models::Comment>>,
    pub users: Arc<MemoryStore<User>>,
    pub permissions: Arc<MemoryPermissionStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub client: SocketAddr,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.limiter.enabled = false;
    config
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let books = Arc::new(MemoryStore::default());
        let reviews = Arc::new(MemoryStore::default());
        let lists = Arc::new(MemoryStore::default());
        let comments = Arc::new(MemoryStore::default());
        let users = Arc::new(MemoryStore::<User>::unique_on("email"));
        let permissions = Arc::new(MemoryPermissionStore::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let state = AppState {
            limiter: Arc::new(RateLimiter::new(config.limiter.clone())),
            config: Arc::new(config),
            books: books.clone(),
            reviews: reviews.clone(),
            lists: lists.clone(),
            list_books: Arc::new(MemoryListBookStore::default()),
            comments: comments.clone(),
            users: users.clone(),
            tokens: TokenService::new(Arc::new(MemoryTokenStore::new(users.clone()))),
            permissions: permissions.clone(),
            background: BackgroundTasks::new(),
            notifier: notifier.clone(),
            db: None,
        };

        Self {
            state,
            books,
            reviews,
            lists,
            comments,
            users,
            permissions,
            notifier,
            client: SocketAddr::from(([127, 0, 0, 1], 40000)),
        }
    }

    pub fn router(&self) -> Router {
        routes::app(self.state.clone())
    }

    /// Creates a user holding `grants` and returns it with a live authentication token.
    pub async fn user_with_token(&self, email: &str, activated: bool, grants: &[&str]) -> (User, String) {
        let user = self
            .users
            .insert(&User {
                username: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash: hash_password("pa55word1234").unwrap(),
                activated,
                ..User::default()
            })
            .await
            .unwrap();
        self.permissions.add_for_user(user.id, grants).await.unwrap();
        let token = self
            .state
            .tokens
            .issue(user.id, chrono::Duration::hours(1), Scope::Authentication)
            .await
            .unwrap();
        (user, token.plaintext)
    }

    /// Sends one request through a fresh router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let mut request = builder.body(body).unwrap();
        request.extensions_mut().insert(ConnectInfo(self.client));

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, headers, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    /// Sends a raw body, for malformed JSON cases.
    pub async fn send_raw(&self, method: Method, uri: &str, token: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let mut request = builder.body(Body::from(body.to_string())).unwrap();
        request.extensions_mut().insert(ConnectInfo(self.client));

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}
