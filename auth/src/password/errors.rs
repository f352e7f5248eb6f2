use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Stored hash is malformed or uses an unsupported algorithm.
    #[error("Password verification failed: {0}")]
    VerificationFailed(String),
}
