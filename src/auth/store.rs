//! In-memory auth state with on-disk token persistence
//!
//! The store is the single owner of the Session data (user + token pair).
//! Tokens survive process restarts in `~/.stockdeck/tokens.json`, written
//! with `0o600`; everything else is reconstructed from token claims.

use std::path::PathBuf;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::token;
use crate::auth::types::{AuthTokens, User};
use crate::utils::error::{Result, StockdeckError};

#[derive(Debug, Default)]
struct AuthState {
    user: Option<User>,
    tokens: Option<AuthTokens>,
}

/// Shared authentication state
#[derive(Debug)]
pub struct AuthStore {
    state: RwLock<AuthState>,
    /// Token file path; `None` keeps the store memory-only (tests)
    path: Option<PathBuf>,
}

impl AuthStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            state: RwLock::new(AuthState::default()),
            path,
        }
    }

    /// Memory-only store, used in tests and short-lived commands
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Default token file path (`~/.stockdeck/tokens.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".stockdeck").join("tokens.json"))
    }

    /// Loads persisted tokens, rebuilding the user from token claims.
    ///
    /// An expired access token is kept: the refresh token may still be good,
    /// and auth checks always re-validate expiry.
    pub async fn load(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        if !path.exists() {
            debug!(path = %path.display(), "No persisted tokens");
            return Ok(());
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| StockdeckError::io(path.clone(), e))?;
        let tokens: AuthTokens = serde_json::from_str(&contents)?;

        let user = token::user_from_token(&tokens.access);
        let mut state = self.state.write().await;
        state.user = user;
        state.tokens = Some(tokens);
        debug!(path = %path.display(), "Loaded persisted tokens");
        Ok(())
    }

    /// Replaces the session after login or refresh and persists the tokens.
    pub async fn set_session(&self, user: Option<User>, tokens: AuthTokens) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.user = user.or_else(|| token::user_from_token(&tokens.access));
            state.tokens = Some(tokens.clone());
        }
        self.persist(&tokens)
    }

    /// Destroys the session and removes persisted tokens.
    ///
    /// Never fails on the filesystem path: a session that cannot be fully
    /// scrubbed from disk is still gone from memory.
    pub async fn clear(&self) {
        {
            let mut state = self.state.write().await;
            state.user = None;
            state.tokens = None;
        }
        if let Some(ref path) = self.path {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "Failed to remove token file");
                }
            }
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .tokens
            .as_ref()
            .map(|t| t.access.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .tokens
            .as_ref()
            .map(|t| t.refresh.clone())
    }

    /// The logged-in user, from state or reconstructed from the access token
    pub async fn current_user(&self) -> Option<User> {
        let state = self.state.read().await;
        if let Some(ref user) = state.user {
            return Some(user.clone());
        }
        state
            .tokens
            .as_ref()
            .and_then(|t| token::user_from_token(&t.access))
    }

    /// A session is valid only while the access token expiry is in the future
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        match state.tokens {
            Some(ref tokens) => match token::decode_claims(&tokens.access) {
                Ok(claims) => !claims.is_expired(),
                Err(_) => false,
            },
            None => false,
        }
    }

    fn persist(&self, tokens: &AuthTokens) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StockdeckError::io(parent.to_path_buf(), e))?;
        }
        let contents = serde_json::to_string_pretty(tokens)?;
        std::fs::write(path, contents).map_err(|e| StockdeckError::io(path.clone(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)
                .map_err(|e| StockdeckError::io(path.clone(), e))?;
        }

        debug!(path = %path.display(), "Persisted tokens");
        Ok(())
    }
}
