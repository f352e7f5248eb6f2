use async_trait::async_trait;
use auth::TokenPair;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::Identity;
use crate::domain::auth::models::Session;
use crate::domain::user::models::User;

/// Port for authentication operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Verify email and password and open a session.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, wrong password or no password set
    /// * `AccountInactive` - Account exists but is not active
    /// * `User` - Lookup failed
    async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Exchange a refresh token for a new token pair.
    ///
    /// # Errors
    /// * `Token` - Refresh token invalid, expired or of another kind
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Check the refresh token being discarded.
    ///
    /// Tokens stay valid until they expire.
    ///
    /// # Errors
    /// * `Token` - Refresh token invalid, expired or of another kind
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Resolve an access token into an identity.
    ///
    /// # Errors
    /// * `Token` - Token invalid, expired or not an access token
    /// * `UnknownSubject` - Role claim does not parse
    async fn authenticate_bearer(&self, token: &str) -> Result<Identity, AuthError>;

    /// Resolve an API key into an identity, recording its use.
    ///
    /// # Errors
    /// * `ApiKeyRejected` - Key unknown, inactive or expired
    /// * `ApiKey` - Lookup failed
    async fn authenticate_api_key(&self, key: &str) -> Result<Identity, AuthError>;

    /// Load the account behind an identity.
    ///
    /// # Errors
    /// * `UnknownSubject` - Account no longer exists
    /// * `User` - Lookup failed
    async fn profile(&self, identity: &Identity) -> Result<User, AuthError>;
}
