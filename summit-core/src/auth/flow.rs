//! Strava login state machine.
//!
//! ```text
//! Idle -> AwaitingProviderRedirect -> AwaitingCallback -> Authenticated
//!                                                      \-> Failed -> Idle
//! ```

use super::oauth::{self, CallbackParams, OAuthConfig};
use super::storage::{LocalStorage, StorageError};
use super::token_store::{CredentialProvider, TokenStoreError};
use crate::http::{ApiClient, ApiError, ApiRequest};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Backend endpoint that exchanges an authorization code for tokens.
pub const CALLBACK_EXCHANGE_PATH: &str = "/auth/strava/callback";

/// Default pause on the failure screen before going back to login.
pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Authorization was denied: {0}")]
    Denied(String),
    #[error("No authorization code in callback")]
    MissingCode,
    #[error("OAuth state mismatch")]
    StateMismatch,
    #[error("Code exchange failed: {0}")]
    Exchange(#[from] ApiError),
    #[error("Failed to store OAuth state: {0}")]
    Storage(#[from] StorageError),
    #[error("Failed to generate OAuth state: {0}")]
    Nonce(String),
    #[error("Invalid authorization URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Where the login flow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    AwaitingProviderRedirect { authorization_url: String },
    AwaitingCallback,
    Authenticated { user_id: i64 },
    Failed { reason: String },
}

impl LoginState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginState::Authenticated { .. })
    }
}

#[derive(Serialize)]
struct CodeExchangeRequest<'a> {
    code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeExchangeResponse {
    access_token: String,
    refresh_token: String,
    user_id: i64,
}

/// Drives the redirect and callback halves of the Strava login.
pub struct LoginFlow {
    config: OAuthConfig,
    storage: Arc<dyn LocalStorage>,
    credentials: Arc<dyn CredentialProvider>,
    api: ApiClient,
    failure_delay: Duration,
    state: Mutex<LoginState>,
    user_id: Mutex<Option<i64>>,
}

impl LoginFlow {
    pub fn new(
        config: OAuthConfig,
        storage: Arc<dyn LocalStorage>,
        credentials: Arc<dyn CredentialProvider>,
        api: ApiClient,
    ) -> Self {
        Self {
            config,
            storage,
            credentials,
            api,
            failure_delay: DEFAULT_FAILURE_DELAY,
            state: Mutex::new(LoginState::Idle),
            user_id: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_failure_delay(mut self, delay: Duration) -> Self {
        self.failure_delay = delay;
        self
    }

    pub fn state(&self) -> LoginState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// User id returned by the last successful code exchange.
    pub fn user_id(&self) -> Option<i64> {
        *self.user_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: LoginState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(from = ?*state, to = ?next, "Login state transition");
        *state = next;
    }

    fn fail(&self, error: LoginError) -> LoginError {
        warn!(error = %error, "Login failed");
        self.set_state(LoginState::Failed {
            reason: error.to_string(),
        });
        error
    }

    /// Generate and persist a fresh state nonce and return the authorization
    /// URL the user should be sent to.
    pub fn begin_login(&self) -> Result<url::Url, LoginError> {
        let nonce = oauth::generate_state().map_err(|e| LoginError::Nonce(e.to_string()))?;
        oauth::store_state(self.storage.as_ref(), &nonce)?;
        let url = self.config.authorization_url(&nonce)?;

        info!("Starting Strava login");
        self.set_state(LoginState::AwaitingProviderRedirect {
            authorization_url: url.to_string(),
        });
        Ok(url)
    }

    /// Record that the user has been sent to the provider.
    pub fn mark_redirected(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, LoginState::AwaitingProviderRedirect { .. }) {
            *state = LoginState::AwaitingCallback;
        }
    }

    /// Single-use check of a returned state against the pending nonce.
    pub fn validate_state(&self, returned: &str) -> bool {
        oauth::validate_state(self.storage.as_ref(), returned)
    }

    /// Handle the provider's redirect back to the app.
    ///
    /// The pending nonce is consumed on every call. Nothing is sent to the
    /// backend unless both a code and a matching state are present.
    pub async fn handle_callback(&self, params: &CallbackParams) -> Result<i64, LoginError> {
        let state_ok = match params.state.as_deref() {
            Some(returned) => self.validate_state(returned),
            None => {
                if let Err(e) = self.storage.remove_item(super::storage::OAUTH_STATE_KEY) {
                    warn!(error = %e, "Failed to delete pending OAuth state");
                }
                false
            }
        };

        if let Some(reason) = &params.error {
            return Err(self.fail(LoginError::Denied(reason.clone())));
        }
        let Some(code) = params.code.as_deref() else {
            return Err(self.fail(LoginError::MissingCode));
        };
        if !state_ok {
            return Err(self.fail(LoginError::StateMismatch));
        }

        let request = match ApiRequest::post(CALLBACK_EXCHANGE_PATH).json(&CodeExchangeRequest { code }) {
            Ok(request) => request,
            Err(e) => return Err(self.fail(e.into())),
        };
        let response: CodeExchangeResponse = match self.api.send_json(request).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e.into())),
        };

        if let Err(e) = self.credentials.store_access(&response.access_token) {
            warn!(error = %e, "Access token kept in memory only");
        }
        if let Err(e) = self.credentials.store_refresh(&response.refresh_token) {
            warn!(error = %e, "Refresh token kept in memory only");
        }
        *self.user_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(response.user_id);

        info!(user_id = response.user_id, "Strava login complete");
        self.set_state(LoginState::Authenticated {
            user_id: response.user_id,
        });
        Ok(response.user_id)
    }

    /// After a failure, wait out the failure delay and go back to `Idle`.
    /// Does nothing in any other state.
    pub async fn return_to_login(&self) {
        if !matches!(self.state(), LoginState::Failed { .. }) {
            return;
        }
        tokio::time::sleep(self.failure_delay).await;
        self.set_state(LoginState::Idle);
    }

    /// Forget the session: both tokens and the cached user id.
    pub fn logout(&self) -> Result<(), TokenStoreError> {
        *self.user_id.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.set_state(LoginState::Idle);
        let result = self.credentials.clear();
        info!("Logged out");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::{MemoryStorage, ACCESS_TOKEN_KEY, OAUTH_STATE_KEY, REFRESH_TOKEN_KEY};
    use crate::auth::TokenStore;
    use crate::http::AuthInterceptor;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        storage: Arc<MemoryStorage>,
        tokens: Arc<TokenStore>,
        flow: LoginFlow,
    }

    fn harness(base_url: &str) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let tokens = Arc::new(TokenStore::new(storage.clone()));
        let api = ApiClient::new(AuthInterceptor::new(base_url, tokens.clone()));
        let config = OAuthConfig::new(
            "49851",
            "https://www.strava.com/oauth/authorize",
            "https://craeyebytes.com/strava/callback",
        )
        .with_scopes("read,activity:read_all");
        let flow = LoginFlow::new(config, storage.clone(), tokens.clone(), api)
            .with_failure_delay(Duration::from_millis(10));
        Harness {
            storage,
            tokens,
            flow,
        }
    }

    fn callback(code: Option<&str>, state: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(str::to_string),
            state: state.map(str::to_string),
            error: None,
        }
    }

    fn pending_state(storage: &MemoryStorage) -> String {
        storage.get_item(OAUTH_STATE_KEY).unwrap().unwrap()
    }

    #[test]
    fn test_begin_login_persists_nonce_in_url() {
        let h = harness("http://localhost:1");
        let url = h.flow.begin_login().unwrap();
        let nonce = pending_state(&h.storage);

        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "state" && v == nonce.as_str()));
        assert!(matches!(
            h.flow.state(),
            LoginState::AwaitingProviderRedirect { .. }
        ));

        h.flow.mark_redirected();
        assert_eq!(h.flow.state(), LoginState::AwaitingCallback);
    }

    #[test]
    fn test_mark_redirected_ignored_when_idle() {
        let h = harness("http://localhost:1");
        h.flow.mark_redirected();
        assert_eq!(h.flow.state(), LoginState::Idle);
    }

    #[test]
    fn test_validate_state_single_use() {
        let h = harness("http://localhost:1");
        oauth::store_state(h.storage.as_ref(), "ab12cd").unwrap();
        assert!(h.flow.validate_state("ab12cd"));
        assert!(!h.flow.validate_state("ab12cd"));
    }

    #[tokio::test]
    async fn test_handle_callback_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/strava/callback"))
            .and(body_json(serde_json::json!({"code": "xyz"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "A",
                "refreshToken": "R",
                "userId": 42
            })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.flow.begin_login().unwrap();
        h.flow.mark_redirected();
        let nonce = pending_state(&h.storage);

        let user_id = h
            .flow
            .handle_callback(&callback(Some("xyz"), Some(&nonce)))
            .await
            .unwrap();

        assert_eq!(user_id, 42);
        assert_eq!(h.flow.user_id(), Some(42));
        assert_eq!(h.flow.state(), LoginState::Authenticated { user_id: 42 });
        assert_eq!(h.tokens.access_token().as_deref(), Some("A"));
        assert_eq!(h.storage.get_item(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("A"));
        assert_eq!(h.storage.get_item(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("R"));
        assert!(h.storage.get_item(OAUTH_STATE_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_handle_callback_state_mismatch_skips_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/strava/callback"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.flow.begin_login().unwrap();

        let err = h
            .flow
            .handle_callback(&callback(Some("xyz"), Some("forged")))
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::StateMismatch));
        assert!(matches!(h.flow.state(), LoginState::Failed { .. }));
        assert!(h.storage.get_item(OAUTH_STATE_KEY).unwrap().is_none());
        assert!(!h.tokens.is_logged_in());
    }

    #[tokio::test]
    async fn test_handle_callback_missing_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.flow.begin_login().unwrap();
        let nonce = pending_state(&h.storage);

        let err = h
            .flow
            .handle_callback(&callback(None, Some(&nonce)))
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::MissingCode));
        // Nonce is spent even though the code was missing
        assert!(!h.flow.validate_state(&nonce));
    }

    #[tokio::test]
    async fn test_handle_callback_replay_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/strava/callback"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "A",
                "refreshToken": "R",
                "userId": 7
            })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.flow.begin_login().unwrap();
        let params = callback(Some("xyz"), Some(&pending_state(&h.storage)));

        h.flow.handle_callback(&params).await.unwrap();
        let err = h.flow.handle_callback(&params).await.unwrap_err();
        assert!(matches!(err, LoginError::StateMismatch));
    }

    #[tokio::test]
    async fn test_handle_callback_denied_by_provider() {
        let h = harness("http://localhost:1");
        h.flow.begin_login().unwrap();
        let params = CallbackParams {
            code: None,
            state: Some(pending_state(&h.storage)),
            error: Some("access_denied".to_string()),
        };

        let err = h.flow.handle_callback(&params).await.unwrap_err();
        assert!(matches!(err, LoginError::Denied(ref r) if r == "access_denied"));
    }

    #[tokio::test]
    async fn test_backend_rejection_then_return_to_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/strava/callback"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let h = harness(&server.uri());
        h.flow.begin_login().unwrap();
        let nonce = pending_state(&h.storage);

        let err = h
            .flow
            .handle_callback(&callback(Some("xyz"), Some(&nonce)))
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::Exchange(_)));
        assert!(matches!(h.flow.state(), LoginState::Failed { .. }));
        assert!(!h.tokens.is_logged_in());

        h.flow.return_to_login().await;
        assert_eq!(h.flow.state(), LoginState::Idle);
    }

    #[tokio::test]
    async fn test_return_to_login_noop_unless_failed() {
        let h = harness("http://localhost:1");
        h.flow.begin_login().unwrap();
        h.flow.return_to_login().await;
        assert!(matches!(
            h.flow.state(),
            LoginState::AwaitingProviderRedirect { .. }
        ));
    }

    #[test]
    fn test_logout_clears_tokens_and_user() {
        let h = harness("http://localhost:1");
        h.tokens.store_access("A").unwrap();
        h.tokens.store_refresh("R").unwrap();

        h.flow.logout().unwrap();

        assert_eq!(h.flow.state(), LoginState::Idle);
        assert!(h.flow.user_id().is_none());
        assert!(!h.tokens.is_logged_in());
        assert!(h.storage.get_item(ACCESS_TOKEN_KEY).unwrap().is_none());
        assert!(h.storage.get_item(REFRESH_TOKEN_KEY).unwrap().is_none());
    }
}
