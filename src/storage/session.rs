use std::fmt;

use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use crate::session::auth::{TokenPair, User};
use crate::storage::store::{CredentialStore, MemoryStore};

/// Typed view over the credential store. Owns the fixed storage keys;
/// everything else in the crate goes through this surface instead of
/// touching keys directly, so tests can substitute an in-memory fake.
pub struct SessionStore {
    store: Box<dyn CredentialStore>,
}

impl SessionStore {
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    pub fn set_tokens(&self, tokens: &TokenPair) {
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access);
        self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh);
    }

    pub fn set_access_token(&self, token: &str) {
        self.store.set(ACCESS_TOKEN_KEY, token);
    }

    /// Presence of the access-token key is the sole authentication
    /// check used elsewhere in the system.
    pub fn is_authenticated(&self) -> bool {
        self.store.get(ACCESS_TOKEN_KEY).is_some()
    }

    pub fn cached_user(&self) -> Option<User> {
        self.store
            .get(USER_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }

    pub fn set_cached_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.store.set(USER_KEY, &raw),
            Err(e) => tracing::warn!("failed to cache user: {}", e),
        }
    }

    pub fn clear(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        self.store.remove(REFRESH_TOKEN_KEY);
        self.store.remove(USER_KEY);
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
