use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use crate::domain::api_key::models::ApiKeyId;
use crate::domain::auth::models::Identity;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

pub const API_KEY_DELETED_MESSAGE: &str = "API key deleted";

pub async fn delete_api_key(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<DeleteApiKeyResponseData>, ApiError> {
    let id = ApiKeyId::from_string(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid API key ID: {}", e)))?;

    state.api_key_service.delete(&identity, &id).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        DeleteApiKeyResponseData {
            message: API_KEY_DELETED_MESSAGE.to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteApiKeyResponseData {
    pub message: String,
}
