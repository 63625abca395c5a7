//! Errors surfaced by the HTTP layer.

use super::REFRESH_PATH;
use crate::auth::TokenStoreError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Token storage error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

impl ApiError {
    /// HTTP status of a non-success response, if that is what this error is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Whether the server answered 401.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Whether the caller should send the user back to the login screen.
    ///
    /// A 401 always counts. A 400 or 403 only counts when the refresh call
    /// itself was rejected; elsewhere it is an ordinary request error.
    pub fn requires_login(&self) -> bool {
        match self {
            ApiError::NotAuthenticated => true,
            ApiError::Status { status, url, .. } => match *status {
                StatusCode::UNAUTHORIZED => true,
                StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN => is_refresh_url(url),
                _ => false,
            },
            other => other.is_unauthorized(),
        }
    }
}

fn is_refresh_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/').ends_with(REFRESH_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode) -> ApiError {
        status_error_at(status, "http://localhost/api/peaks")
    }

    fn status_error_at(status: StatusCode, url: &str) -> ApiError {
        ApiError::Status {
            status,
            url: url.to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn test_status_and_unauthorized() {
        let err = status_error(StatusCode::UNAUTHORIZED);
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(err.is_unauthorized());

        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_unauthorized());
        assert!(!err.requires_login());
    }

    #[test]
    fn test_requires_login() {
        assert!(ApiError::NotAuthenticated.requires_login());
        assert!(status_error(StatusCode::UNAUTHORIZED).requires_login());
        assert!(ApiError::NotAuthenticated.status().is_none());
    }

    #[test]
    fn test_bad_request_requires_login_only_from_refresh() {
        let validation = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            url: "https://craeyebytes.com/api/groups".to_string(),
            body: "name is required".to_string(),
        };
        assert!(!validation.requires_login());
        assert!(!status_error(StatusCode::FORBIDDEN).requires_login());

        let refresh = status_error_at(StatusCode::BAD_REQUEST, "https://craeyebytes.com/auth/refresh");
        assert!(refresh.requires_login());
        let refresh = status_error_at(StatusCode::FORBIDDEN, "https://craeyebytes.com/auth/refresh?x=1");
        assert!(refresh.requires_login());
    }

    #[test]
    fn test_display_includes_status_and_body() {
        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            url: "http://localhost/api/challenge".to_string(),
            body: "no such challenge".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("no such challenge"));
    }
}
