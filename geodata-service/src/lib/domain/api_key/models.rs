use std::fmt;

use base64ct::Base64Url;
use base64ct::Encoding;
use chrono::DateTime;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::domain::api_key::errors::ApiKeyError;
use crate::domain::api_key::errors::ApiKeyIdError;
use crate::domain::api_key::errors::ApiKeyNameError;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;

/// Long-lived credential issued to a machine client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub user_id: UserId,
    pub name: String,
    pub key: String,
    pub owner_role: Role,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Prefix of every generated key string.
    pub const PREFIX: &'static str = "UG_";

    /// Random bytes behind the key string.
    pub const SECRET_BYTES: usize = 32;

    /// Whether the key may authenticate a request at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |expires_at| expires_at > now)
    }

    /// Generate a fresh key string: the prefix followed by padded URL-safe
    /// base64 of bytes from the operating system RNG.
    ///
    /// # Errors
    /// * `KeyGeneration` - Operating system RNG unavailable
    pub fn generate_secret() -> Result<String, ApiKeyError> {
        let mut bytes = [0u8; Self::SECRET_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| ApiKeyError::KeyGeneration(e.to_string()))?;

        Ok(format!("{}{}", Self::PREFIX, Base64Url::encode_string(&bytes)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApiKeyId(pub Uuid);

impl ApiKeyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a key ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, ApiKeyIdError> {
        Uuid::parse_str(s)
            .map(ApiKeyId)
            .map_err(|e| ApiKeyIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for ApiKeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Human label of an API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyName(String);

impl ApiKeyName {
    const MAX_LENGTH: usize = 255;

    /// Create a validated key name; surrounding whitespace is dropped.
    ///
    /// # Errors
    /// * `Empty` - Name is blank
    /// * `TooLong` - Name exceeds 255 characters
    pub fn new(name: &str) -> Result<Self, ApiKeyNameError> {
        let name = name.trim();
        let length = name.chars().count();
        if length == 0 {
            Err(ApiKeyNameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(ApiKeyNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
