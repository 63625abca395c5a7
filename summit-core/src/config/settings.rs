//! Application settings for Summit Seekers.
//!
//! Settings are persisted to the SQLite database as JSON.

use crate::auth::OAuthConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// Defaults
// =============================================================================

/// Backend the web app is served from.
pub const DEFAULT_API_BASE_URL: &str = "https://craeyebytes.com";

/// Strava application client id.
pub const DEFAULT_OAUTH_CLIENT_ID: &str = "49851";

/// Strava authorization page.
pub const DEFAULT_OAUTH_AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";

/// Where Strava sends the user back to.
pub const DEFAULT_OAUTH_REDIRECT_URI: &str = "https://craeyebytes.com/strava/callback";

/// Comma-separated Strava scopes.
pub const DEFAULT_OAUTH_SCOPES: &str = "read,activity:read_all";

const MAX_FAILURE_DELAY_MS: u64 = 30_000;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// Application Settings
// =============================================================================

/// Application settings - persisted to database as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the backend API.
    pub api_base_url: String,

    /// Strava OAuth client id.
    pub oauth_client_id: String,

    /// Strava authorization endpoint.
    pub oauth_authorize_url: String,

    /// Redirect target registered with Strava.
    pub oauth_redirect_uri: String,

    /// Requested scopes.
    pub oauth_scopes: String,

    /// How long a failed login stays on the failure screen before returning
    /// to the login screen.
    pub login_failure_delay_ms: u64,

    /// Client-wide request timeout in seconds. 0 uses the HTTP client default.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            oauth_client_id: DEFAULT_OAUTH_CLIENT_ID.to_string(),
            oauth_authorize_url: DEFAULT_OAUTH_AUTHORIZE_URL.to_string(),
            oauth_redirect_uri: DEFAULT_OAUTH_REDIRECT_URI.to_string(),
            oauth_scopes: DEFAULT_OAUTH_SCOPES.to_string(),
            login_failure_delay_ms: 2000,
            request_timeout_secs: 0,
        }
    }
}

impl Settings {
    /// Load settings from database, using defaults for missing values.
    ///
    /// If settings don't exist or can't be parsed, returns defaults.
    pub fn load(db: &crate::db::Database) -> Self {
        let mut settings = Self::default();

        if let Ok(Some(json)) = db.get_setting("settings") {
            match serde_json::from_str::<Settings>(&json) {
                Ok(loaded) => settings = loaded,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse settings, using defaults");
                }
            }
        }

        settings.validate();
        settings
    }

    /// Save settings to database.
    pub fn save(&self, db: &crate::db::Database) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        db.set_setting("settings", &json)?;
        Ok(())
    }

    /// Validate and clamp settings to valid ranges.
    pub fn validate(&mut self) {
        self.login_failure_delay_ms = self.login_failure_delay_ms.min(MAX_FAILURE_DELAY_MS);
        self.request_timeout_secs = self.request_timeout_secs.min(MAX_REQUEST_TIMEOUT_SECS);

        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        self.api_base_url = if trimmed.is_empty() {
            DEFAULT_API_BASE_URL.to_string()
        } else {
            trimmed.to_string()
        };

        if self.oauth_client_id.trim().is_empty() {
            self.oauth_client_id = DEFAULT_OAUTH_CLIENT_ID.to_string();
        }
        if self.oauth_authorize_url.trim().is_empty() {
            self.oauth_authorize_url = DEFAULT_OAUTH_AUTHORIZE_URL.to_string();
        }
        if self.oauth_redirect_uri.trim().is_empty() {
            self.oauth_redirect_uri = DEFAULT_OAUTH_REDIRECT_URI.to_string();
        }
    }

    /// OAuth parameters for building the authorization URL.
    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig::new(
            &self.oauth_client_id,
            &self.oauth_authorize_url,
            &self.oauth_redirect_uri,
        )
        .with_scopes(&self.oauth_scopes)
    }

    pub fn login_failure_delay(&self) -> Duration {
        Duration::from_millis(self.login_failure_delay_ms)
    }
}

// =============================================================================
// Tests
// =============================================================================
