use async_trait::async_trait;

use crate::domain::email::models::EmailMessage;
use crate::domain::password_reset::errors::PasswordResetError;
use crate::domain::password_reset::models::PasswordReset;
use crate::domain::user::models::User;

/// Port for password-reset and registration operations.
#[async_trait]
pub trait PasswordResetServicePort: Send + Sync + 'static {
    /// Issue a reset token for the account behind `email` and email a link to it.
    ///
    /// # Returns
    /// The signed reset token
    ///
    /// # Errors
    /// * `InvalidEmail` - Address is malformed
    /// * `UnknownEmail` - No account uses this address
    /// * `Email` - Message could not be enqueued; no reset record was kept
    /// * `DatabaseError` - Database operation failed
    async fn initiate(&self, email: &str) -> Result<String, PasswordResetError>;

    /// Create an INACTIVE account for `email` and send it a set-password link.
    ///
    /// # Returns
    /// The new account with the signed set-password token
    ///
    /// # Errors
    /// * `InvalidEmail` - Address is malformed
    /// * `EmailTaken` - An account already uses this address
    /// * `Email` - Message could not be enqueued; no account was kept
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, email: &str) -> Result<(User, String), PasswordResetError>;

    /// Set a new password using a reset token.
    ///
    /// # Errors
    /// * `PasswordMismatch` - Confirmation differs; nothing was read or written
    /// * `PasswordTooShort` - New password below minimum length
    /// * `Token` / `UnknownToken` - Token invalid, expired or not on record
    /// * `AlreadyConsumed` - Token was used before
    /// * `DatabaseError` - Transaction failed and was rolled back
    async fn consume(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), PasswordResetError>;
}

/// Reset record inserted inside an open transaction.
///
/// Dropping it without `commit` rolls back the insert and every email
/// enqueued through it.
#[async_trait]
pub trait PendingReset: Send {
    fn reset(&self) -> &PasswordReset;

    /// Write `message` to the outbox inside the same transaction.
    ///
    /// # Errors
    /// * `Email` - Message could not be enqueued
    async fn enqueue_email(&mut self, message: &EmailMessage) -> Result<(), PasswordResetError>;

    /// # Errors
    /// * `DatabaseError` - Commit failed
    async fn commit(self: Box<Self>) -> Result<(), PasswordResetError>;
}

/// Persistence operations for reset records.
#[async_trait]
pub trait PasswordResetRepository: Send + Sync + 'static {
    /// Open a transaction and insert `reset` into it.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn begin_issue(
        &self,
        reset: PasswordReset,
    ) -> Result<Box<dyn PendingReset>, PasswordResetError>;

    /// Open a transaction and insert `user` followed by `reset` into it.
    ///
    /// # Errors
    /// * `EmailTaken` - Another account uses the address
    /// * `DatabaseError` - Database operation failed
    async fn begin_registration(
        &self,
        user: &User,
        reset: PasswordReset,
    ) -> Result<Box<dyn PendingReset>, PasswordResetError>;

    /// Retrieve a record by its token string.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>, PasswordResetError>;

    /// In one transaction: mark `reset` INACTIVE, store `password_hash` on
    /// its user and set the user ACTIVE.
    ///
    /// # Errors
    /// * `AlreadyConsumed` - Record was no longer ACTIVE; nothing changed
    /// * `DatabaseError` - Transaction failed and was rolled back
    async fn consume(
        &self,
        reset: &PasswordReset,
        password_hash: &str,
    ) -> Result<(), PasswordResetError>;
}
