use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::api_key::errors::ApiKeyError;
use crate::domain::api_key::models::ApiKey;
use crate::domain::api_key::models::ApiKeyId;
use crate::domain::api_key::models::ApiKeyName;
use crate::domain::auth::models::Identity;
use crate::domain::user::models::UserId;

/// Port for managing the API keys of an authenticated owner.
#[async_trait]
pub trait ApiKeyServicePort: Send + Sync + 'static {
    /// Issue a new key owned by `identity`.
    ///
    /// # Returns
    /// The stored key, including its secret string
    ///
    /// # Errors
    /// * `ExpiryInPast` - `expires_at` is not after now
    /// * `InvalidSubject` - Identity does not name a user
    /// * `KeyGeneration` - No randomness available
    /// * `DatabaseError` - Database operation failed
    async fn create(
        &self,
        identity: &Identity,
        name: ApiKeyName,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ApiKey, ApiKeyError>;

    /// List the keys owned by `identity`, newest first.
    ///
    /// # Errors
    /// * `InvalidSubject` - Identity does not name a user
    /// * `DatabaseError` - Database operation failed
    async fn list(&self, identity: &Identity) -> Result<Vec<ApiKey>, ApiKeyError>;

    /// Delete one key owned by `identity`.
    ///
    /// # Errors
    /// * `NotFound` - No key with this id belongs to the owner
    /// * `InvalidSubject` - Identity does not name a user
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, identity: &Identity, id: &ApiKeyId) -> Result<(), ApiKeyError>;
}

/// Persistence operations for API keys.
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + 'static {
    /// Retrieve an active key by its presented string.
    ///
    /// Expiry is not evaluated here.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_active_by_key(&self, key: &str) -> Result<Option<ApiKey>, ApiKeyError>;

    /// Bump the usage counter and last-used timestamp.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn increment_usage(&self, id: &ApiKeyId) -> Result<(), ApiKeyError>;

    /// Store a new key.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, key: &ApiKey) -> Result<(), ApiKeyError>;

    /// Retrieve all keys of `user_id`, newest first.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<ApiKey>, ApiKeyError>;

    /// Delete key `id` if `user_id` owns it.
    ///
    /// # Returns
    /// Whether a key was deleted
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, user_id: &UserId, id: &ApiKeyId) -> Result<bool, ApiKeyError>;
}
