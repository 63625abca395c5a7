//! Configuration module for Summit Seekers.
//!
//! Manages application settings stored in SQLite.

mod settings;

pub use settings::{
    Settings, DEFAULT_API_BASE_URL, DEFAULT_OAUTH_AUTHORIZE_URL, DEFAULT_OAUTH_CLIENT_ID,
    DEFAULT_OAUTH_REDIRECT_URI, DEFAULT_OAUTH_SCOPES,
};
