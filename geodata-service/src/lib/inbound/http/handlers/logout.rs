use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::cookies;
use crate::inbound::http::router::AppState;

/// Clear the session cookies. Issued tokens stay valid until they expire.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiSuccess<LogoutResponseData>), ApiError> {
    let refresh_token = jar
        .get(cookies::REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(ApiError::Unauthorized)?;

    state.auth_service.logout(&refresh_token).await?;

    Ok((
        cookies::without_session(jar, &state.cookies),
        ApiSuccess::new(
            StatusCode::OK,
            LogoutResponseData {
                message: "Logged out".to_string(),
            },
        ),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutResponseData {
    pub message: String,
}
