//! Wire types for the authentication endpoints

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Access/refresh token pair as returned by login and register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub access: String,
    pub refresh: String,
}

impl AuthResponse {
    pub fn tokens(&self) -> AuthTokens {
        AuthTokens {
            access: self.access.clone(),
            refresh: self.refresh.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Logout carries the refresh token so the server can revoke it
#[derive(Debug, Serialize)]
pub struct LogoutRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Token refresh response; the server may or may not rotate the refresh token
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_deserialization() {
        let json = r#"{
            "user": {"id": "7", "email": "a@b.c", "name": "Ada"},
            "access": "acc",
            "refresh": "ref"
        }"#;

        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.user.name, "Ada");
        assert_eq!(
            response.tokens(),
            AuthTokens {
                access: "acc".to_string(),
                refresh: "ref".to_string()
            }
        );
    }

    #[test]
    fn test_refresh_response_without_rotation() {
        let json = r#"{"access": "new-access"}"#;
        let response: RefreshResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access, "new-access");
        assert!(response.refresh.is_none());
    }
}
