use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::password_reset::errors::PasswordResetError;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::router::AppState;

pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists for this address, a password reset link has been sent";

/// Start a password reset. Known and unknown addresses get the same answer.
///
/// Only the address format is checked before responding; the lookup, token
/// minting and outbox write run on a spawned task.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequestBody>,
) -> Result<ApiSuccess<ResetPasswordResponseData>, ApiError> {
    let email = EmailAddress::new(&body.email).map_err(PasswordResetError::from)?;

    let service = Arc::clone(&state.password_reset_service);
    tokio::spawn(async move {
        match service.initiate(email.as_str()).await {
            Ok(_) => {}
            Err(PasswordResetError::UnknownEmail) => {
                tracing::info!("Password reset requested for unknown address");
            }
            Err(e) => {
                tracing::error!(error = %e, "Password reset not issued");
            }
        }
    });

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ResetPasswordResponseData {
            message: RESET_REQUESTED_MESSAGE.to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequestBody {
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPasswordResponseData {
    pub message: String,
}
