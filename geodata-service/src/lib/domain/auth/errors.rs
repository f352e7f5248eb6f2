use auth::JwtError;
use thiserror::Error;

use crate::domain::api_key::errors::ApiKeyError;
use crate::domain::user::errors::UserError;

/// Errors of login, session and credential checks.
///
/// Every variant except the infrastructure ones is a credential failure and
/// reaches clients as the same unauthorized response.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account inactive")]
    AccountInactive,

    #[error("Token rejected: {0}")]
    Token(#[from] JwtError),

    #[error("Token subject does not resolve to an account: {0}")]
    UnknownSubject(String),

    #[error("API key rejected")]
    ApiKeyRejected,

    #[error("Both a session token and an API key were presented")]
    AmbiguousCredentials,

    #[error("No credentials presented")]
    MissingCredentials,

    #[error("Credential header is malformed")]
    MalformedCredentials,

    // Infrastructure errors
    #[error("User lookup failed: {0}")]
    User(#[from] UserError),

    #[error("API key lookup failed: {0}")]
    ApiKey(#[from] ApiKeyError),

    #[error("Token issuance failed: {0}")]
    Issuance(String),
}

impl AuthError {
    /// Whether this error is a credential failure rather than an outage.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            AuthError::Token(e) => e.is_unauthorized(),
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::UnknownSubject(_)
            | AuthError::ApiKeyRejected
            | AuthError::AmbiguousCredentials
            | AuthError::MissingCredentials
            | AuthError::MalformedCredentials => true,
            AuthError::User(_) | AuthError::ApiKey(_) | AuthError::Issuance(_) => false,
        }
    }
}

impl From<auth::AuthenticationError> for AuthError {
    fn from(err: auth::AuthenticationError) -> Self {
        match err {
            auth::AuthenticationError::InvalidCredentials => AuthError::InvalidCredentials,
            auth::AuthenticationError::Jwt(e) => AuthError::Issuance(e.to_string()),
            auth::AuthenticationError::Password(e) => AuthError::Issuance(e.to_string()),
        }
    }
}
