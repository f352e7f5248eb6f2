use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use super::errors::ApiKeyError;
use super::models::ApiKey;
use super::models::ApiKeyId;
use super::models::ApiKeyName;
use super::ports::ApiKeyRepository;
use super::ports::ApiKeyServicePort;
use crate::domain::auth::models::Identity;
use crate::domain::user::models::UserId;

/// Domain service implementation for API key management.
pub struct ApiKeyService<AK>
where
    AK: ApiKeyRepository,
{
    api_keys: Arc<AK>,
}

impl<AK> ApiKeyService<AK>
where
    AK: ApiKeyRepository,
{
    pub fn new(api_keys: Arc<AK>) -> Self {
        Self { api_keys }
    }
}

fn owner(identity: &Identity) -> Result<UserId, ApiKeyError> {
    Ok(UserId::from_string(&identity.subject)?)
}

#[async_trait]
impl<AK> ApiKeyServicePort for ApiKeyService<AK>
where
    AK: ApiKeyRepository,
{
    async fn create(
        &self,
        identity: &Identity,
        name: ApiKeyName,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ApiKey, ApiKeyError> {
        let now = Utc::now();
        if expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(ApiKeyError::ExpiryInPast);
        }

        let key = ApiKey {
            id: ApiKeyId::new(),
            user_id: owner(identity)?,
            name: name.as_str().to_string(),
            key: ApiKey::generate_secret()?,
            owner_role: identity.role,
            last_used_at: None,
            expires_at,
            usage_count: 0,
            is_active: true,
            created_at: now,
        };

        self.api_keys.create(&key).await?;

        tracing::info!(api_key_id = %key.id, user_id = %key.user_id, "API key created");

        Ok(key)
    }

    async fn list(&self, identity: &Identity) -> Result<Vec<ApiKey>, ApiKeyError> {
        self.api_keys.list_by_user(&owner(identity)?).await
    }

    async fn delete(&self, identity: &Identity, id: &ApiKeyId) -> Result<(), ApiKeyError> {
        let user_id = owner(identity)?;
        if !self.api_keys.delete(&user_id, id).await? {
            return Err(ApiKeyError::NotFound(*id));
        }

        tracing::info!(api_key_id = %id, user_id = %user_id, "API key deleted");

        Ok(())
    }
}
