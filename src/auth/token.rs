//! Client-side access-token inspection
//!
//! The server signs the tokens; this client only reads claims to know who is
//! logged in and when the token expires. Signature validation is therefore
//! disabled on decode, but expiry is always checked before trusting a token.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::types::User;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Malformed access token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
}

/// Claims carried by the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Expiration, seconds since the epoch
    pub exp: u64,
    pub user_id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AccessClaims {
    /// True when `exp` is in the past
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp();
        now >= self.exp as i64
    }
}

/// Decodes the claims of an access token without verifying the signature.
///
/// Expiry is deliberately not validated here: callers decide whether an
/// expired token is an error (auth checks) or merely stale data.
pub fn decode_claims(token: &str) -> Result<AccessClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Reconstructs the logged-in user from a non-expired access token.
///
/// Returns `None` for a malformed or expired token.
pub fn user_from_token(token: &str) -> Option<User> {
    let claims = match decode_claims(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to decode access token");
            return None;
        }
    };

    if claims.is_expired() {
        return None;
    }

    Some(User {
        id: claims.user_id.to_string(),
        email: claims.email.unwrap_or_default(),
        name: claims.name.unwrap_or_default(),
    })
}
