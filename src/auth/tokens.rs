use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

use crate::database::models::token::TOKEN_LENGTH;
use crate::database::models::{Scope, Token, User};
use crate::database::{DatabaseError, TokenStore};

/// RFC 4648 base32 alphabet.
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// 26 base32 characters, about 130 bits from the OS CSPRNG.
pub fn generate_plaintext() -> String {
    let mut rng = OsRng;
    (0..TOKEN_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn hash_plaintext(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

pub fn generate_token(user_id: i64, ttl: Duration, scope: Scope) -> Token {
    let plaintext = generate_plaintext();
    let hash = hash_plaintext(&plaintext);
    Token {
        plaintext,
        hash,
        user_id,
        expiry: Utc::now() + ttl,
        scope,
    }
}

/// Issues, resolves and revokes scoped tokens.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Creates and persists a token; the returned plaintext is not stored anywhere.
    pub async fn issue(&self, user_id: i64, ttl: Duration, scope: Scope) -> Result<Token, DatabaseError> {
        let token = generate_token(user_id, ttl, scope);
        self.store.insert(&token).await?;
        tracing::debug!(user_id, scope = scope.as_str(), "issued token");
        Ok(token)
    }

    /// Resolves a live token to its owner.
    ///
    /// Unknown, expired and wrongly-scoped tokens all fail with
    /// [`DatabaseError::NotFound`].
    pub async fn get_for_token(&self, scope: Scope, plaintext: &str) -> Result<User, DatabaseError> {
        let hash = hash_plaintext(plaintext);
        self.store.user_for_token(scope, &hash, Utc::now()).await
    }

    pub async fn delete_all_for_user(&self, scope: Scope, user_id: i64) -> Result<(), DatabaseError> {
        self.store.delete_all_for_user(scope, user_id).await
    }
}
