use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::domain::api_key::errors::ApiKeyError;
use crate::domain::auth::errors::AuthError;
use crate::domain::password_reset::errors::PasswordResetError;

pub mod api_keys;
pub mod health;
pub mod login;
pub mod logout;
pub mod profile;
pub mod refresh;
pub mod register;
pub mod reset_password;
pub mod set_password;

/// Single message for every credential failure.
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid or expired credentials";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized,
    TooManyRequests { retry_after_secs: u64 },
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match self {
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                UNAUTHORIZED_MESSAGE.to_string(),
                None,
            ),
            ApiError::TooManyRequests { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
                Some(retry_after_secs),
            ),
        };

        let mut response =
            (status, Json(ApiResponseBody::new_error(status, message))).into_response();

        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_unauthorized() {
            tracing::warn!(cause = %err, "Credential rejected");
            ApiError::Unauthorized
        } else {
            ApiError::InternalServerError(err.to_string())
        }
    }
}

impl From<PasswordResetError> for ApiError {
    fn from(err: PasswordResetError) -> Self {
        match err {
            PasswordResetError::PasswordMismatch
            | PasswordResetError::PasswordTooShort { .. }
            | PasswordResetError::InvalidEmail(_) => ApiError::UnprocessableEntity(err.to_string()),
            PasswordResetError::AlreadyConsumed | PasswordResetError::EmailTaken => {
                ApiError::Conflict(err.to_string())
            }
            PasswordResetError::Token(ref cause) if !cause.is_unauthorized() => {
                ApiError::InternalServerError(err.to_string())
            }
            PasswordResetError::Token(_)
            | PasswordResetError::UnknownToken
            | PasswordResetError::UnknownEmail => {
                tracing::warn!(cause = %err, "Reset credential rejected");
                ApiError::Unauthorized
            }
            PasswordResetError::Hashing(_)
            | PasswordResetError::User(_)
            | PasswordResetError::Email(_)
            | PasswordResetError::DatabaseError(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

impl From<ApiKeyError> for ApiError {
    fn from(err: ApiKeyError) -> Self {
        match err {
            ApiKeyError::InvalidApiKeyId(_) => ApiError::BadRequest(err.to_string()),
            ApiKeyError::InvalidName(_) | ApiKeyError::ExpiryInPast => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            ApiKeyError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ApiKeyError::InvalidSubject(_) => {
                tracing::warn!(cause = %err, "Identity without user subject");
                ApiError::Unauthorized
            }
            ApiKeyError::KeyGeneration(_)
            | ApiKeyError::InvalidStoredValue(_)
            | ApiKeyError::DatabaseError(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}
