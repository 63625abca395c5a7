//! Wires storage, tokens, the HTTP client, login flow and services together.

use crate::auth::{LocalStorage, LoginFlow, TokenStore};
use crate::config::Settings;
use crate::http::{ApiClient, ApiError};
use crate::services::Services;
use std::sync::Arc;
use tracing::debug;

pub struct Session {
    settings: Settings,
    tokens: Arc<TokenStore>,
    api: ApiClient,
    login: LoginFlow,
    services: Services,
}

impl Session {
    /// Build a session on `storage`, loading any persisted tokens.
    pub fn new(settings: Settings, storage: Arc<dyn LocalStorage>) -> Result<Self, ApiError> {
        let tokens = Arc::new(TokenStore::load_from(storage.clone()));
        let api = ApiClient::from_settings(&settings, tokens.clone())?;
        let login = LoginFlow::new(settings.oauth_config(), storage, tokens.clone(), api.clone())
            .with_failure_delay(settings.login_failure_delay());
        let services = Services::new(&api);
        debug!(
            base_url = %settings.api_base_url,
            logged_in = tokens.is_logged_in(),
            "Session ready"
        );
        Ok(Self {
            settings,
            tokens,
            api,
            login,
            services,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn login(&self) -> &LoginFlow {
        &self.login
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn is_logged_in(&self) -> bool {
        self.tokens.is_logged_in()
    }
}
