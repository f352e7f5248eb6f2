use auth::TokenPair;

use crate::domain::api_key::models::ApiKey;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;

/// Authenticated principal attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
    pub method: AuthMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Session,
    ApiKey(ApiKey),
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Session => "session",
            AuthMethod::ApiKey(_) => "api_key",
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub tokens: TokenPair,
}
