//! Strava authorization URL, state nonce and callback parameters.

use super::storage::{LocalStorage, OAUTH_STATE_KEY};
use std::fmt::Write;
use tracing::{debug, warn};
use url::Url;

/// Number of random bytes in a state nonce (hex encoded, so twice as many chars).
const STATE_NONCE_BYTES: usize = 16;

/// OAuth parameters for the provider's authorization page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub authorize_url: String,
    pub redirect_uri: String,
    /// Comma-separated, as Strava expects.
    pub scopes: String,
}

impl OAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        authorize_url: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            authorize_url: authorize_url.into(),
            redirect_uri: redirect_uri.into(),
            scopes: String::new(),
        }
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = scopes.into();
        self
    }

    /// Authorization URL embedding the client, redirect target, scopes and state.
    pub fn authorization_url(&self, state: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.authorize_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes)
            .append_pair("state", state);
        Ok(url)
    }
}

/// Generate a random hex nonce.
pub fn generate_state() -> Result<String, getrandom::Error> {
    let mut bytes = [0u8; STATE_NONCE_BYTES];
    getrandom::getrandom(&mut bytes)?;
    let mut s = String::with_capacity(STATE_NONCE_BYTES * 2);
    for b in bytes {
        // Writing to a String cannot fail
        let _ = write!(s, "{:02x}", b);
    }
    Ok(s)
}

/// Persist `state` as the pending nonce, replacing any earlier one.
pub fn store_state(storage: &dyn LocalStorage, state: &str) -> Result<(), super::StorageError> {
    storage.set_item(OAUTH_STATE_KEY, state)
}

/// Single-use comparison of a returned state against the pending nonce.
///
/// The pending nonce is deleted whatever the outcome, so a second call with
/// the same value returns false.
pub fn validate_state(storage: &dyn LocalStorage, returned: &str) -> bool {
    let stored = match storage.get_item(OAUTH_STATE_KEY) {
        Ok(stored) => stored,
        Err(e) => {
            warn!(error = %e, "Failed to read pending OAuth state");
            None
        }
    };

    if let Err(e) = storage.remove_item(OAUTH_STATE_KEY) {
        warn!(error = %e, "Failed to delete pending OAuth state");
    }

    let valid = stored.as_deref() == Some(returned);
    debug!(had_pending = stored.is_some(), valid, "Validated OAuth state");
    valid
}

/// Query parameters the provider sends back to the redirect target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denies access.
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse from a full redirect URL (`https://host/cb?code=..&state=..`).
    pub fn from_url(redirect: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(redirect)?;
        Ok(Self::from_pairs(url.query_pairs()))
    }

    /// Parse from a bare query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Parse whatever the user pasted: a URL or a query string.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        Self::from_url(input).unwrap_or_else(|_| Self::from_query(input))
    }

    fn from_pairs<'a>(
        pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    ) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = Some(value.into_owned()).filter(|v| !v.is_empty());
            match key.as_ref() {
                "code" => params.code = value,
                "state" => params.state = value,
                "error" => params.error = value,
                _ => {}
            }
        }
        params
    }
}
