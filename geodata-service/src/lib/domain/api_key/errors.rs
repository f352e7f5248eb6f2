use thiserror::Error;

use crate::domain::api_key::models::ApiKeyId;
use crate::domain::user::errors::UserIdError;

/// Error type for ApiKeyId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiKeyIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error type for ApiKeyName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiKeyNameError {
    #[error("API key name is empty")]
    Empty,

    #[error("API key name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Top-level error type for API key operations
#[derive(Debug, Clone, Error)]
pub enum ApiKeyError {
    #[error("Invalid API key ID: {0}")]
    InvalidApiKeyId(#[from] ApiKeyIdError),

    #[error("Invalid API key name: {0}")]
    InvalidName(#[from] ApiKeyNameError),

    #[error("Expiry must be in the future")]
    ExpiryInPast,

    #[error("Invalid subject: {0}")]
    InvalidSubject(#[from] UserIdError),

    #[error("API key not found: {0}")]
    NotFound(ApiKeyId),

    // Infrastructure errors
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid stored value: {0}")]
    InvalidStoredValue(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
