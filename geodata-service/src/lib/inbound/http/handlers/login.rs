use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::cookies;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequestBody>,
) -> Result<(CookieJar, ApiSuccess<LoginResponseData>), ApiError> {
    let session = state.auth_service.login(&body.email, &body.password).await?;

    let jar = cookies::with_session(jar, &session.tokens, &state.cookies);
    let access = &session.tokens.access;

    Ok((
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            LoginResponseData {
                access_token: access.token.clone(),
                refresh_token: session.tokens.refresh.token.clone(),
                user_id: session.user.id.to_string(),
                role: session.user.role.to_string(),
                expires_in: access.claims.exp - access.claims.iat,
            },
        ),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    email: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub role: String,
    pub expires_in: i64,
}
