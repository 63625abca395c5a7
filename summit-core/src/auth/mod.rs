//! Authentication for the Summit Seekers backend.
//!
//! This module provides:
//! - Key/value local storage (SQLite or in-memory)
//! - The access/refresh token store
//! - Strava OAuth redirect, state nonce and callback handling

mod flow;
mod oauth;
mod storage;
mod token_store;

pub use flow::{LoginError, LoginFlow, LoginState, CALLBACK_EXCHANGE_PATH, DEFAULT_FAILURE_DELAY};
pub use oauth::{generate_state, store_state, validate_state, CallbackParams, OAuthConfig};
pub use storage::{
    LocalStorage, MemoryStorage, SqliteStorage, StorageError, ACCESS_TOKEN_KEY, OAUTH_STATE_KEY,
    REFRESH_TOKEN_KEY,
};
pub use token_store::{CredentialProvider, TokenStore, TokenStoreError};
