//! Outbound request descriptor.

use super::ApiError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use url::Url;

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// A request to the backend, kept around so it can be re-sent after a
/// token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter when `value` is present.
    #[must_use]
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Set a header, replacing any previous value.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::Encode)?);
        Ok(self)
    }

    /// Whether this request targets the refresh endpoint. Such requests carry
    /// the refresh token instead of the access token and never trigger a
    /// refresh.
    pub fn is_refresh(&self) -> bool {
        self.path.contains(REFRESH_PATH)
    }

    /// Resolve against the API base URL.
    pub fn url(&self, base_url: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), self.path))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_refresh() {
        assert!(ApiRequest::post("/auth/refresh").is_refresh());
        assert!(!ApiRequest::get("/api/activities").is_refresh());
        assert!(!ApiRequest::post("/auth/strava/callback").is_refresh());
    }

    #[test]
    fn test_url_joins_base_and_query() {
        let request = ApiRequest::get("/api/challenges/public")
            .query("region", "Western Cape")
            .query("limit", 10)
            .query_opt::<u32>("offset", None);

        let url = request.url("https://example.com/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/api/challenges/public?region=Western+Cape&limit=10"
        );
    }

    #[test]
    fn test_url_without_query_has_no_question_mark() {
        let url = ApiRequest::get("/api/peaks")
            .url("http://localhost:8080")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/peaks");
    }

    #[test]
    fn test_json_body() {
        let request = ApiRequest::post("/api/summit-favourites")
            .json(&serde_json::json!({ "peak_id": 7 }))
            .unwrap();
        assert_eq!(request.body, Some(serde_json::json!({ "peak_id": 7 })));
    }
}
