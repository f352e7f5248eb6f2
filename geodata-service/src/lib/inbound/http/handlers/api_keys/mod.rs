use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::api_key::models::ApiKey;

pub mod create_api_key;
pub mod delete_api_key;
pub mod list_api_keys;

pub use create_api_key::create_api_key;
pub use delete_api_key::delete_api_key;
pub use list_api_keys::list_api_keys;

/// Listed key; the secret string is only returned on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeySummaryData {
    pub id: String,
    pub name: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&ApiKey> for ApiKeySummaryData {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id.to_string(),
            name: key.name.clone(),
            last_used_at: key.last_used_at,
            expires_at: key.expires_at,
            usage_count: key.usage_count,
            is_active: key.is_active,
            created_at: key.created_at,
        }
    }
}
