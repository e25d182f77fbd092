pub mod service;
pub mod store;
pub mod token;
pub mod types;

pub use service::{AuthError, AuthService, SessionTerminator};
pub use store::AuthStore;
pub use types::{AuthResponse, AuthTokens, User};
