use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::cookies;
use crate::inbound::http::router::AppState;

/// Rotate the session. The refresh token comes from the `refresh_token`
/// cookie, or from a JSON body for clients without a cookie store.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, ApiSuccess<RefreshResponseData>), ApiError> {
    let refresh_token = jar
        .get(cookies::REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            serde_json::from_slice::<RefreshRequestBody>(&body)
                .ok()
                .map(|body| body.refresh_token)
        })
        .ok_or(ApiError::Unauthorized)?;

    let tokens = state.auth_service.refresh(&refresh_token).await?;

    let jar = cookies::with_session(jar, &tokens, &state.cookies);
    let access = &tokens.access;

    Ok((
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            RefreshResponseData {
                access_token: access.token.clone(),
                expires_in: access.claims.exp - access.claims.iat,
            },
        ),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshRequestBody {
    refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshResponseData {
    pub access_token: String,
    pub expires_in: i64,
}
