use auth::JwtError;
use auth::PasswordError;
use thiserror::Error;

use crate::domain::email::errors::EmailDeliveryError;
use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::UserError;

/// Errors of the password-reset and registration flows
#[derive(Debug, Clone, Error)]
pub enum PasswordResetError {
    // Request validation errors
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password too short: minimum {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Email is already in use")]
    EmailTaken,

    // Lookup failures, never surfaced with their cause
    #[error("No account for email")]
    UnknownEmail,

    #[error("Reset token rejected: {0}")]
    Token(#[from] JwtError),

    #[error("Reset token not on record")]
    UnknownToken,

    #[error("Reset token already consumed")]
    AlreadyConsumed,

    // Infrastructure errors
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] PasswordError),

    #[error("User lookup failed: {0}")]
    User(#[from] UserError),

    #[error("Email delivery failed: {0}")]
    Email(#[from] EmailDeliveryError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
