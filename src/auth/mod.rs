//! Bearer-token authentication.
//!
//! Passwords are stored as argon2 PHC strings. A successful signup or login
//! issues an HS256 JWT whose subject is the user id; private handlers take an
//! [`AuthUser`] extractor that verifies it.

mod extractor;
mod jwt;
mod password;

use std::sync::Arc;

pub use extractor::AuthUser;
pub use jwt::{issue_token, verify_token, Claims, JwtError, TOKEN_LIFETIME_MINUTES};
pub use password::{hash_password, verify_password, PasswordError};

/// Signing material shared by the token issuer and the extractor.
#[derive(Clone)]
pub struct AuthConfig {
    secret: Arc<str>,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Arc::from(secret.into()),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}
