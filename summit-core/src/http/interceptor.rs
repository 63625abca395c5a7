//! Credential attachment and one-shot refresh-and-retry.

use super::request::{ApiRequest, REFRESH_PATH};
use super::ApiError;
use crate::auth::CredentialProvider;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Body returned by the refresh endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Every backend call passes through here.
///
/// Non-refresh requests get `Authorization: Bearer <access token>`. A 401
/// triggers exactly one refresh followed by exactly one retry; whatever the
/// retry returns is final.
pub struct AuthInterceptor {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl AuthInterceptor {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_http_client(Client::new(), base_url, credentials)
    }

    /// Build with a client-wide request timeout.
    pub fn with_timeout(
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(http, base_url, credentials))
    }

    /// Create with a custom reqwest::Client (useful for testing).
    pub fn with_http_client(
        http: Client,
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    /// Send `request`, recovering once from an expired access token.
    pub async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        // The refresh endpoint authenticates with the refresh token and is
        // never retried
        if request.is_refresh() {
            let refresh_token = self.credentials.refresh_token();
            return self.dispatch(&request, refresh_token.as_deref()).await;
        }

        let access_token = self.credentials.access_token();
        match self.dispatch(&request, access_token.as_deref()).await {
            Err(e) if e.is_unauthorized() => {
                info!(method = %request.method, path = %request.path, "Access token rejected, refreshing");
                let new_token = self.refresh().await?;
                debug!(path = %request.path, "Retrying request with refreshed token");
                self.dispatch(&request, Some(&new_token)).await
            }
            other => other,
        }
    }

    /// Exchange the refresh token for a new access token and store it.
    ///
    /// The refresh token is sent as the bearer credential. Errors are
    /// returned exactly as the refresh call produced them.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        let refresh_token = self.credentials.refresh_token().ok_or_else(|| {
            warn!("No refresh token available");
            ApiError::NotAuthenticated
        })?;

        let request = ApiRequest::post(REFRESH_PATH);
        let response = self.dispatch(&request, Some(&refresh_token)).await?;
        let url = response.url().to_string();
        let bytes = response.bytes().await?;
        let body: RefreshResponse =
            serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { url, source })?;

        if let Err(e) = self.credentials.store_access(&body.access_token) {
            warn!(error = %e, "Refreshed access token kept in memory only");
        }
        if let Some(rotated) = &body.refresh_token {
            if let Err(e) = self.credentials.store_refresh(rotated) {
                warn!(error = %e, "Rotated refresh token kept in memory only");
            }
        }

        info!("Access token refreshed");
        Ok(body.access_token)
    }

    /// Send once. Non-success statuses become [`ApiError::Status`].
    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = request.url(&self.base_url)?;

        let mut headers = request.headers.clone();
        if let Some(token) = bearer {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                warn!(path = %request.path, "Stored token is not a valid header value");
                ApiError::NotAuthenticated
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        debug!(method = %request.method, url = %url, authorized = bearer.is_some(), "Sending request");

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, method = %request.method, path = %request.path, "Request failed");
        Err(ApiError::Status {
            status,
            url: url.to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryStorage, TokenStore};
    use reqwest::StatusCode;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn store_with(access: Option<&str>, refresh: Option<&str>) -> Arc<TokenStore> {
        let store = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new())));
        if let Some(a) = access {
            store.store_access(a).unwrap();
        }
        if let Some(r) = refresh {
            store.store_refresh(r).unwrap();
        }
        store
    }

    fn interceptor(server: &MockServer, store: Arc<TokenStore>) -> AuthInterceptor {
        AuthInterceptor::new(&server.uri(), store)
    }

    #[tokio::test]
    async fn test_attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/peaks"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let interceptor = interceptor(&server, store_with(Some("access-1"), None));
        let response = interceptor.execute(ApiRequest::get("/api/peaks")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_no_header_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/peaks"))
            .and(|req: &Request| !req.headers.contains_key("authorization"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let interceptor = interceptor(&server, store_with(None, None));
        interceptor.execute(ApiRequest::get("/api/peaks")).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_request_uses_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(header("authorization", "Bearer refresh-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let interceptor = interceptor(&server, store_with(Some("access-1"), Some("refresh-1")));
        interceptor
            .execute(ApiRequest::post("/auth/refresh"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_refresh_sends_refresh_token_and_stores_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(header("authorization", "Bearer refresh-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "accessToken": "access-2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = store_with(Some("access-1"), Some("refresh-1"));
        let interceptor = interceptor(&server, store.clone());

        let token = interceptor.refresh().await.unwrap();
        assert_eq!(token, "access-2");
        assert_eq!(store.get(), Some("access-2".to_string()));
        assert_eq!(store.refresh_token(), Some("refresh-1".to_string()));
    }

    #[tokio::test]
    async fn test_refresh_stores_rotated_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "access-2",
                "refreshToken": "refresh-2"
            })))
            .mount(&server)
            .await;

        let store = store_with(None, Some("refresh-1"));
        interceptor(&server, store.clone()).refresh().await.unwrap();
        assert_eq!(store.refresh_token(), Some("refresh-2".to_string()));
    }

    #[tokio::test]
    async fn test_401_refreshes_once_and_retries_with_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/activities"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(header("authorization", "Bearer refresh-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "fresh" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/activities"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_with(Some("stale"), Some("refresh-1"));
        let interceptor = interceptor(&server, store.clone());

        let response = interceptor
            .execute(ApiRequest::get("/api/activities"))
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!([{"id": 1}]));
        assert_eq!(store.get(), Some("fresh".to_string()));
    }

    #[tokio::test]
    async fn test_retry_resends_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/groups"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "fresh" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/groups"))
            .and(header("authorization", "Bearer fresh"))
            .and(wiremock::matchers::body_json(serde_json::json!({ "name": "Hikers" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let interceptor = interceptor(&server, store_with(Some("stale"), Some("refresh-1")));
        let request = ApiRequest::post("/api/groups")
            .json(&serde_json::json!({ "name": "Hikers" }))
            .unwrap();
        let response = interceptor.execute(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_returned_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/activities"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid refresh token"))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_with(Some("stale"), Some("refresh-1"));
        let interceptor = interceptor(&server, store.clone());

        let err = interceptor
            .execute(ApiRequest::get("/api/activities"))
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, body, url } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, "invalid refresh token");
                assert!(url.ends_with("/auth/refresh"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.get(), Some("stale".to_string()));
    }

    #[tokio::test]
    async fn test_second_401_is_not_retried_again() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "fresh" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let interceptor = interceptor(&server, store_with(Some("stale"), Some("refresh-1")));
        let err = interceptor
            .execute(ApiRequest::get("/api/profile"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_other_errors_pass_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/progress"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let interceptor = interceptor(&server, store_with(Some("a"), Some("r")));
        let err = interceptor
            .execute(ApiRequest::get("/api/progress"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_401_without_refresh_token_is_not_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/peaks"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let interceptor = interceptor(&server, store_with(Some("a"), None));
        let err = interceptor
            .execute(ApiRequest::get("/api/peaks"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_401_on_refresh_path_does_not_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let interceptor = interceptor(&server, store_with(Some("a"), Some("r")));
        let err = interceptor
            .execute(ApiRequest::post("/auth/refresh"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_unusable_token_maps_to_not_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/peaks"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new())));
        store.store_access("abc\u{7f}def").unwrap();
        let interceptor = interceptor(&server, store);
        let err = interceptor
            .execute(ApiRequest::get("/api/peaks"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
        assert!(err.requires_login());
    }

    #[tokio::test]
    async fn test_pasted_token_with_newline_is_trimmed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/peaks"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let interceptor = interceptor(&server, store_with(Some("abc\n"), None));
        interceptor.execute(ApiRequest::get("/api/peaks")).await.unwrap();
    }
}
