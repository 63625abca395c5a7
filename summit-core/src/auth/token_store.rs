//! In-memory credential pair mirrored into local storage.

use super::storage::{LocalStorage, StorageError, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Failed to persist {key}: {source}")]
    Persist {
        key: &'static str,
        #[source]
        source: StorageError,
    },
}

/// Source of credentials for outgoing requests.
///
/// Implemented by [`TokenStore`]; injected into the request interceptor
/// and the login flow so neither reaches for global state.
pub trait CredentialProvider: Send + Sync {
    /// Current access token, if any.
    fn access_token(&self) -> Option<String>;
    /// Current refresh token, if any.
    fn refresh_token(&self) -> Option<String>;
    /// Replace the access token.
    fn store_access(&self, token: &str) -> Result<(), TokenStoreError>;
    /// Replace the refresh token.
    fn store_refresh(&self, token: &str) -> Result<(), TokenStoreError>;
    /// Forget both tokens.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

#[derive(Debug, Default, Clone)]
struct Credentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Single source of truth for the current credential pair.
///
/// Writes go to memory first and are then mirrored into storage, so a
/// storage failure never leaves the in-memory value stale.
pub struct TokenStore {
    storage: Arc<dyn LocalStorage>,
    credentials: RwLock<Credentials>,
}

impl TokenStore {
    /// Create an empty store on top of `storage`. Call [`TokenStore::load`]
    /// to pick up persisted tokens.
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            credentials: RwLock::new(Credentials::default()),
        }
    }

    /// Create a store and immediately load persisted tokens.
    pub fn load_from(storage: Arc<dyn LocalStorage>) -> Self {
        let store = Self::new(storage);
        store.load();
        store
    }

    /// Populate memory from storage. Safe to call any number of times.
    ///
    /// Unreadable entries are logged and skipped, leaving the store logged out.
    pub fn load(&self) {
        let access = self.read_persisted(ACCESS_TOKEN_KEY);
        let refresh = self.read_persisted(REFRESH_TOKEN_KEY);

        let mut creds = self.write_lock();
        if access.is_some() {
            creds.access_token = access;
        }
        if refresh.is_some() {
            creds.refresh_token = refresh;
        }
        debug!(
            has_access_token = creds.access_token.is_some(),
            has_refresh_token = creds.refresh_token.is_some(),
            "Loaded tokens from storage"
        );
    }

    /// Current access token, or `None` when logged out.
    pub fn get(&self) -> Option<String> {
        self.read_lock().access_token.clone()
    }

    /// Whether an access token is held.
    pub fn is_logged_in(&self) -> bool {
        self.read_lock().access_token.is_some()
    }

    fn read_persisted(&self, key: &'static str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key, error = %e, "Failed to read token from storage");
                None
            }
        }
    }

    fn persist(&self, key: &'static str, value: &str) -> Result<(), TokenStoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|source| TokenStoreError::Persist { key, source })
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, Credentials> {
        self.credentials.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Credentials> {
        self.credentials.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialProvider for TokenStore {
    fn access_token(&self) -> Option<String> {
        self.get()
    }

    fn refresh_token(&self) -> Option<String> {
        self.read_lock().refresh_token.clone()
    }

    // Surrounding whitespace (a pasted newline) would make the bearer header
    // unsendable, so it is dropped on the way in
    fn store_access(&self, token: &str) -> Result<(), TokenStoreError> {
        let token = token.trim();
        self.write_lock().access_token = Some(token.to_string());
        self.persist(ACCESS_TOKEN_KEY, token)
    }

    fn store_refresh(&self, token: &str) -> Result<(), TokenStoreError> {
        let token = token.trim();
        self.write_lock().refresh_token = Some(token.to_string());
        self.persist(REFRESH_TOKEN_KEY, token)
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.write_lock() = Credentials::default();

        let access = self
            .storage
            .remove_item(ACCESS_TOKEN_KEY)
            .map_err(|source| TokenStoreError::Persist {
                key: ACCESS_TOKEN_KEY,
                source,
            });
        let refresh = self
            .storage
            .remove_item(REFRESH_TOKEN_KEY)
            .map_err(|source| TokenStoreError::Persist {
                key: REFRESH_TOKEN_KEY,
                source,
            });
        debug!("Cleared stored tokens");
        access.and(refresh)
    }
}
