//! Authentication REST calls and sign-out seam
//!
//! Endpoints are consumed as opaque request/response pairs; the store owns
//! the resulting session state. Sign-out is exposed through the
//! [`SessionTerminator`] trait so the session lifecycle can force logout
//! without knowing about HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::store::AuthStore;
use crate::auth::types::{
    AuthResponse, LoginRequest, LogoutRequest, RefreshRequest, RefreshResponse, RegisterRequest,
};
use crate::auth::types::AuthTokens;
use crate::utils::error::StockdeckError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StockdeckError),
}

/// Anything that can terminate the authenticated session.
///
/// Implemented by [`AuthService`]; tests substitute a mock so expiry paths
/// run without a network.
#[async_trait]
pub trait SessionTerminator: Send + Sync {
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// REST authentication service
pub struct AuthService {
    api: ApiClient,
    store: Arc<AuthStore>,
}

impl AuthService {
    pub fn new(api: ApiClient, store: Arc<AuthStore>) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &Arc<AuthStore> {
        &self.store
    }

    /// Registers a new account. Does not establish a session; the caller
    /// logs in afterwards.
    pub async fn register(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, AuthError> {
        let request = RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        let response: AuthResponse = self.api.post("/auth/register/", &request).await?;
        info!(email = %request.email, "Registered account");
        Ok(response)
    }

    /// Logs in and stores the resulting session.
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, AuthError> {
        let request = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        let response: AuthResponse = self.api.post("/auth/login/", &request).await?;
        self.store
            .set_session(Some(response.user.clone()), response.tokens())
            .await?;
        info!(user = %response.user.email, "Logged in");
        Ok(response)
    }

    /// Logs out: destroys local session state first, then asks the server to
    /// revoke the refresh token.
    ///
    /// Local termination is unconditional. A failed revocation is reported,
    /// but by the time the caller sees the error the session is already gone.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let refresh = self.store.refresh_token().await;
        self.store.clear().await;

        let Some(refresh) = refresh else {
            return Err(AuthError::MissingRefreshToken);
        };

        let request = LogoutRequest { refresh };
        match self
            .api
            .post::<_, serde_json::Value>("/auth/logout/", &request)
            .await
        {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Server-side token revocation failed");
                Err(e.into())
            }
        }
    }

    /// Exchanges the refresh token for a fresh access token.
    pub async fn refresh(&self) -> Result<AuthTokens, AuthError> {
        let refresh = self
            .store
            .refresh_token()
            .await
            .ok_or(AuthError::MissingRefreshToken)?;

        let request = RefreshRequest {
            refresh: refresh.clone(),
        };
        let response: RefreshResponse = self.api.post("/auth/refresh/", &request).await?;

        let tokens = AuthTokens {
            access: response.access,
            // Servers that do not rotate keep the old refresh token
            refresh: response.refresh.unwrap_or(refresh),
        };
        self.store.set_session(None, tokens.clone()).await?;
        info!("Refreshed access token");
        Ok(tokens)
    }
}

#[async_trait]
impl SessionTerminator for AuthService {
    async fn sign_out(&self) -> Result<(), AuthError> {
        self.logout().await
    }
}
