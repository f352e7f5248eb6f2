use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Kind of a signed token, carried in the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim set signed inside every issued token.
///
/// Every field is mandatory: a token lacking any of them fails to
/// deserialize and is rejected before its contents are used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (opaque user identifier)
    pub sub: String,

    /// JWT ID, unique per token
    pub jti: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Token kind
    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Role of the subject at issuance time
    pub role: String,
}

impl Claims {
    /// Build claims valid from `now` for `lifetime`, with a fresh token ID.
    ///
    /// Issuer and audience are both set to `identity`.
    pub fn new(
        subject: impl ToString,
        role: impl ToString,
        kind: TokenKind,
        identity: &str,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        let issued_at = now.timestamp();

        Self {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: (now + lifetime).timestamp(),
            iss: identity.to_string(),
            aud: identity.to_string(),
            kind,
            role: role.to_string(),
        }
    }

    /// Seconds of validity left at `current_timestamp` (zero once expired).
    pub fn remaining_seconds(&self, current_timestamp: i64) -> i64 {
        (self.exp - current_timestamp).max(0)
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}
