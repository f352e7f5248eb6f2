use chrono::Duration;

use crate::jwt::JwtError;

/// Lifetimes of the tokens minted by the session service.
///
/// `refresh_ttl` always exceeds `access_ttl`, so a refresh token can renew
/// an access token that has already expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionConfig {
    /// Default access token lifetime: 15 minutes.
    pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;
    /// Default refresh token lifetime: 7 days.
    pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

    /// # Errors
    /// * `Configuration` - A lifetime is not positive, or refresh does not outlive access
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, JwtError> {
        if access_ttl <= Duration::zero() {
            return Err(JwtError::Configuration(
                "access token lifetime must be positive".to_string(),
            ));
        }
        if refresh_ttl <= access_ttl {
            return Err(JwtError::Configuration(
                "refresh token lifetime must exceed access token lifetime".to_string(),
            ));
        }

        Ok(Self {
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(Self::DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(Self::DEFAULT_REFRESH_TTL_DAYS),
        }
    }
}
