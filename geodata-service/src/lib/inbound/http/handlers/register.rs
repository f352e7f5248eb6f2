use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

pub const REGISTERED_MESSAGE: &str = "Registration email sent";

/// Create an INACTIVE account and email it a set-password link.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequestBody>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    let (user, _) = state.password_reset_service.register(&body.email).await?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        RegisterResponseData {
            message: REGISTERED_MESSAGE.to_string(),
            user_id: user.id.to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequestBody {
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResponseData {
    pub message: String,
    pub user_id: String,
}
