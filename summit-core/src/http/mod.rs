//! Authenticated HTTP access to the Summit Seekers backend.
//!
//! - [`ApiRequest`]: cloneable request descriptor
//! - [`AuthInterceptor`]: bearer attachment plus one refresh-and-retry on 401
//! - [`ApiClient`]: typed JSON helpers used by the domain services

mod client;
mod error;
mod interceptor;
mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::AuthInterceptor;
pub use request::{ApiRequest, REFRESH_PATH};
