//! Shared REST transport for the dashboard API
//!
//! Every service call goes through [`ApiClient`], which owns the base URL,
//! the HTTP client, and bearer-token injection from the auth store. Response
//! status codes are mapped to a small error taxonomy so callers can tell
//! "retry later" from "the session is gone".

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::store::AuthStore;
use crate::config::Config;

/// Errors that can occur when talking to the REST API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network-level failures (DNS, connect, timeout)
    #[error("Network error: {message}")]
    Network { message: String },

    /// 401/403 responses; the session is no longer valid
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// 429 responses
    #[error("Too many requests. Please try again later.")]
    RateLimited,

    /// 404 responses
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Any other non-success status
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {message}")]
    Decode { message: String },
}

impl ApiError {
    /// True when the failure invalidates the session (fail-closed path)
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode {
                message: err.to_string(),
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Maps a non-success response status to an [`ApiError`]
fn classify_status(status: StatusCode, path: &str, body: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth {
            message: if body.is_empty() {
                status.to_string()
            } else {
                body
            },
        },
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        StatusCode::NOT_FOUND => ApiError::NotFound {
            path: path.to_string(),
        },
        _ => ApiError::Status {
            status: status.as_u16(),
            message: body,
        },
    }
}

/// HTTP client for the dashboard REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    auth: Arc<AuthStore>,
}

impl ApiClient {
    /// Creates a client from configuration, sharing the auth store for
    /// bearer-token injection.
    pub fn new(config: &Config, auth: Arc<AuthStore>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds a request with the access token attached when one exists.
    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = self.auth.access_token().await {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Sends the request and applies the status taxonomy. Both the typed
    /// and the body-less paths go through here so the mapping cannot drift.
    async fn send_checked(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status, path, body);
            warn!(path = path, status = status.as_u16(), error = %err, "API request failed");
            return Err(err);
        }

        debug!(path = path, status = status.as_u16(), "API request succeeded");
        Ok(response)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = self.send_checked(builder, path).await?;
        response.json::<T>().await.map_err(|e| ApiError::Decode {
            message: e.to_string(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path).await;
        self.execute(builder, path).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path).await.json(body);
        self.execute(builder, path).await
    }

    /// DELETE with no expected response body
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, path).await;
        self.send_checked(builder, path).await?;
        Ok(())
    }
}
