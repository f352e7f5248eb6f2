use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::AuthMethod;
use crate::domain::auth::models::Identity;
use crate::inbound::http::router::AppState;

pub async fn profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiSuccess<ProfileResponseData>, ApiError> {
    let user = state.auth_service.profile(&identity).await?;

    let api_key = match &identity.method {
        AuthMethod::ApiKey(key) => Some(ApiKeyData {
            id: key.id.to_string(),
            name: key.name.clone(),
            expires_at: key.expires_at,
        }),
        AuthMethod::Session => None,
    };

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ProfileResponseData {
            id: user.id.to_string(),
            email: user.email.as_str().to_string(),
            role: identity.role.to_string(),
            status: user.status.as_str().to_string(),
            auth_method: identity.method.as_str().to_string(),
            api_key,
            created_at: user.created_at,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileResponseData {
    pub id: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub auth_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKeyData>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeyData {
    pub id: String,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}
