use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for stored enumerations (status, role) that do not parse
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariantError {
    pub kind: &'static str,
    pub value: String,
}

/// Top-level error for user lookups
#[derive(Debug, Clone, Error)]
pub enum UserError {
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid stored value: {0}")]
    InvalidStoredValue(#[from] UnknownVariantError),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
