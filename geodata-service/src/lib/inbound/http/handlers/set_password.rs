use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

/// Consume a reset token and set the account's password.
pub async fn set_password(
    State(state): State<AppState>,
    Query(query): Query<SetPasswordQuery>,
    Json(body): Json<SetPasswordRequestBody>,
) -> Result<ApiSuccess<SetPasswordResponseData>, ApiError> {
    state
        .password_reset_service
        .consume(&query.token, &body.password, &body.confirm_password)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        SetPasswordResponseData {
            message: "Password updated".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetPasswordQuery {
    token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetPasswordRequestBody {
    password: String,
    confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetPasswordResponseData {
    pub message: String,
}
