use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::TokenKind;
use auth::TokenPair;
use chrono::Utc;

use crate::domain::api_key::models::ApiKey;
use crate::domain::api_key::ports::ApiKeyRepository;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthMethod;
use crate::domain::auth::models::Identity;
use crate::domain::auth::models::Session;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

/// Domain service implementation for authentication.
pub struct AuthService<UR, AK>
where
    UR: UserRepository,
    AK: ApiKeyRepository,
{
    users: Arc<UR>,
    api_keys: Arc<AK>,
    authenticator: Arc<Authenticator>,
}

impl<UR, AK> AuthService<UR, AK>
where
    UR: UserRepository,
    AK: ApiKeyRepository,
{
    pub fn new(users: Arc<UR>, api_keys: Arc<AK>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            users,
            api_keys,
            authenticator,
        }
    }

    fn record_api_key_use(&self, key: &ApiKey) {
        let api_keys = Arc::clone(&self.api_keys);
        let key_id = key.id;

        tokio::spawn(async move {
            if let Err(e) = api_keys.increment_usage(&key_id).await {
                tracing::warn!(api_key_id = %key_id, error = %e, "Failed to record API key usage");
            }
        });
    }
}

#[async_trait]
impl<UR, AK> AuthServicePort for AuthService<UR, AK>
where
    UR: UserRepository,
    AK: ApiKeyRepository,
{
    async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let Ok(email) = EmailAddress::new(email) else {
            return Err(self.authenticator.verify_decoy(password).into());
        };

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => return Err(self.authenticator.verify_decoy(password).into()),
        };

        let Some(password_hash) = user.password_hash.as_deref() else {
            tracing::debug!(user_id = %user.id, "Login attempt for account without password");
            return Err(self.authenticator.verify_decoy(password).into());
        };

        let tokens = self.authenticator.authenticate(
            password,
            password_hash,
            &user.id.to_string(),
            user.role.as_str(),
        )?;

        if !user.is_active() {
            return Err(AuthError::AccountInactive);
        }

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(Session { user, tokens })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let tokens = self.authenticator.sessions().refresh(refresh_token)?;
        tracing::debug!(subject = %tokens.access.claims.sub, "Session refreshed");
        Ok(tokens)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .authenticator
            .sessions()
            .validate_kind(refresh_token, TokenKind::Refresh)?;
        tracing::info!(subject = %claims.sub, "User logged out");
        Ok(())
    }

    async fn authenticate_bearer(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self
            .authenticator
            .sessions()
            .validate_kind(token, TokenKind::Access)?;

        let role = claims
            .role
            .parse::<Role>()
            .map_err(|e| AuthError::UnknownSubject(e.to_string()))?;

        Ok(Identity {
            subject: claims.sub,
            role,
            method: AuthMethod::Session,
        })
    }

    async fn authenticate_api_key(&self, key: &str) -> Result<Identity, AuthError> {
        let api_key = self
            .api_keys
            .find_active_by_key(key)
            .await?
            .ok_or(AuthError::ApiKeyRejected)?;

        if !api_key.is_usable_at(Utc::now()) {
            return Err(AuthError::ApiKeyRejected);
        }

        self.record_api_key_use(&api_key);

        Ok(Identity {
            subject: api_key.user_id.to_string(),
            role: api_key.owner_role,
            method: AuthMethod::ApiKey(api_key),
        })
    }

    async fn profile(&self, identity: &Identity) -> Result<User, AuthError> {
        let user_id = UserId::from_string(&identity.subject)
            .map_err(|e| AuthError::UnknownSubject(e.to_string()))?;

        self.users
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::UnknownSubject(identity.subject.clone()))
    }
}
