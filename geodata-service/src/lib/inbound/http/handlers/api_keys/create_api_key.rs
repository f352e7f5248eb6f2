use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::api_key::models::ApiKey;
use crate::domain::api_key::models::ApiKeyName;
use crate::domain::auth::models::Identity;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

pub const API_KEY_CREATED_MESSAGE: &str = "API key created";

pub async fn create_api_key(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateApiKeyRequestBody>,
) -> Result<ApiSuccess<CreateApiKeyResponseData>, ApiError> {
    let name =
        ApiKeyName::new(&body.name).map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    state
        .api_key_service
        .create(&identity, name, body.expires_at)
        .await
        .map_err(ApiError::from)
        .map(|ref key| ApiSuccess::new(StatusCode::CREATED, key.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateApiKeyRequestBody {
    name: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateApiKeyResponseData {
    pub message: String,
    pub id: String,
    pub name: String,
    pub key: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&ApiKey> for CreateApiKeyResponseData {
    fn from(key: &ApiKey) -> Self {
        Self {
            message: API_KEY_CREATED_MESSAGE.to_string(),
            id: key.id.to_string(),
            name: key.name.clone(),
            key: key.key.clone(),
            expires_at: key.expires_at,
            created_at: key.created_at,
        }
    }
}
