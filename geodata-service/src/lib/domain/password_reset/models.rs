use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::errors::UnknownVariantError;
use crate::domain::user::models::UserId;

/// Persisted password-reset record.
///
/// Created ACTIVE; moves to INACTIVE exactly once, when consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub id: PasswordResetId,
    pub user_id: UserId,
    pub token: String,
    pub status: ResetStatus,
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    /// A fresh ACTIVE record for `token`.
    pub fn new(user_id: UserId, token: String) -> Self {
        Self {
            id: PasswordResetId(Uuid::new_v4()),
            user_id,
            token,
            status: ResetStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ResetStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PasswordResetId(pub Uuid);

impl fmt::Display for PasswordResetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStatus {
    Active,
    Inactive,
}

impl ResetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetStatus::Active => "ACTIVE",
            ResetStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for ResetStatus {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ResetStatus::Active),
            "INACTIVE" => Ok(ResetStatus::Inactive),
            other => Err(UnknownVariantError {
                kind: "reset status",
                value: other.to_string(),
            }),
        }
    }
}

/// Settings of the reset flow.
#[derive(Debug, Clone)]
pub struct PasswordResetConfig {
    /// Lifetime of an emailed reset token
    pub token_ttl: chrono::Duration,

    /// Lifetime of the set-password token sent on registration
    pub registration_ttl: chrono::Duration,

    /// Page that receives `?token=` and posts the new password
    pub link_base_url: String,
}

impl PasswordResetConfig {
    pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;
    pub const DEFAULT_REGISTRATION_TTL_HOURS: i64 = 24;
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}?token={}", self.link_base_url.trim_end_matches('?'), token)
    }
}
