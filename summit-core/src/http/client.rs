//! Typed JSON calls on top of the interceptor.

use super::{ApiError, ApiRequest, AuthInterceptor};
use crate::auth::CredentialProvider;
use crate::config::Settings;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Cheap-to-clone handle shared by every domain service.
#[derive(Clone)]
pub struct ApiClient {
    interceptor: Arc<AuthInterceptor>,
}

impl ApiClient {
    pub fn new(interceptor: AuthInterceptor) -> Self {
        Self {
            interceptor: Arc::new(interceptor),
        }
    }

    /// Build from persisted settings.
    pub fn from_settings(
        settings: &Settings,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let interceptor = match settings.request_timeout_secs {
            0 => AuthInterceptor::new(&settings.api_base_url, credentials),
            secs => AuthInterceptor::with_timeout(
                &settings.api_base_url,
                credentials,
                Duration::from_secs(secs),
            )?,
        };
        Ok(Self::new(interceptor))
    }

    pub fn interceptor(&self) -> &AuthInterceptor {
        &self.interceptor
    }

    /// Send and decode a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.interceptor.execute(request).await?;
        let url = response.url().to_string();
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { url, source })
    }

    /// Send and discard the response body.
    pub async fn send(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.interceptor.execute(request).await?;
        Ok(())
    }

    /// `GET path` decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(ApiRequest::get(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryStorage, TokenStore};
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
    }

    fn client(server: &MockServer) -> ApiClient {
        let store = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new())));
        ApiClient::new(AuthInterceptor::new(&server.uri(), store))
    }

    #[tokio::test]
    async fn test_get_json_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 3}])))
            .mount(&server)
            .await;

        let items: Vec<Item> = client(&server).get_json("/api/items").await.unwrap();
        assert_eq!(items, vec![Item { id: 3 }]);
    }

    #[tokio::test]
    async fn test_decode_error_names_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/items"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_json::<Vec<Item>>("/api/items")
            .await
            .unwrap_err();
        match err {
            ApiError::Decode { url, .. } => assert!(url.ends_with("/api/items")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_ignores_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/challenge"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .send(ApiRequest::delete("/api/challenge").query("id", 4))
            .await
            .unwrap();
    }

    #[test]
    fn test_from_settings_with_timeout() {
        let mut settings = Settings::default();
        settings.api_base_url = "http://localhost:9999/".to_string();
        settings.request_timeout_secs = 5;

        let store = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new())));
        let client = ApiClient::from_settings(&settings, store).unwrap();
        assert_eq!(client.interceptor().base_url(), "http://localhost:9999");
    }
}
