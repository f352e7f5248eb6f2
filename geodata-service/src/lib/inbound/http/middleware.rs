use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::time::Duration;

use auth::Admission;
use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use super::cookies::ACCESS_TOKEN_COOKIE;
use super::handlers::ApiError;
use crate::domain::auth::errors::AuthError;
use crate::inbound::http::router::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Middleware that admits requests through the per-client token bucket.
///
/// Runs before authentication so rejected clients never reach token verification.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return Ok(next.run(req).await);
    };

    let client = client_ip(&req, state.trust_forwarded_for);

    match limiter.check(&client) {
        Admission::Allowed => Ok(next.run(req).await),
        Admission::Limited { retry_after } => {
            tracing::warn!(
                client = %client,
                path = %req.uri().path(),
                retry_after_ms = retry_after.as_millis() as u64,
                "Rate limit exceeded"
            );
            Err(ApiError::TooManyRequests {
                retry_after_secs: whole_seconds(retry_after),
            })
        }
    }
}

/// Middleware that resolves the request's credential into an [`Identity`]
/// and adds it to request extensions
///
/// [`Identity`]: crate::domain::auth::models::Identity
pub async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match extract_credential(req.headers(), &jar)? {
        Credential::Bearer(token) => state.auth_service.authenticate_bearer(&token).await?,
        Credential::ApiKey(key) => state.auth_service.authenticate_api_key(&key).await?,
    };

    tracing::debug!(
        subject = %identity.subject,
        role = %identity.role,
        method = identity.method.as_str(),
        "Request authenticated"
    );

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

#[derive(Debug, PartialEq, Eq)]
enum Credential {
    Bearer(String),
    ApiKey(String),
}

fn extract_credential(headers: &HeaderMap, jar: &CookieJar) -> Result<Credential, AuthError> {
    let bearer = match headers.get(header::AUTHORIZATION) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AuthError::MalformedCredentials)?;
            let token = value
                .strip_prefix("Bearer ")
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .ok_or(AuthError::MalformedCredentials)?;
            Some(token.to_string())
        }
        None => jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty()),
    };

    let api_key = match headers.get(API_KEY_HEADER) {
        Some(value) => {
            let key = value
                .to_str()
                .map_err(|_| AuthError::MalformedCredentials)?
                .trim();
            (!key.is_empty()).then(|| key.to_string())
        }
        None => None,
    };

    match (bearer, api_key) {
        (Some(_), Some(_)) => Err(AuthError::AmbiguousCredentials),
        (Some(token), None) => Ok(Credential::Bearer(token)),
        (None, Some(key)) => Ok(Credential::ApiKey(key)),
        (None, None) => Err(AuthError::MissingCredentials),
    }
}

/// Client identity for admission control: the socket peer, or the last
/// `X-Forwarded-For` hop when the service runs behind a trusted proxy.
///
/// Only the last hop is written by that proxy; earlier entries come from the
/// client and are ignored.
fn client_ip(req: &Request, trust_forwarded_for: bool) -> IpAddr {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next_back())
            .and_then(|last| last.trim().parse::<IpAddr>().ok());

        if let Some(ip) = forwarded {
            return ip;
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Round up to whole seconds, never below one.
fn whole_seconds(duration: Duration) -> u64 {
    let seconds = duration.as_secs();
    let seconds = if duration.subsec_nanos() > 0 {
        seconds.saturating_add(1)
    } else {
        seconds
    };
    seconds.max(1)
}
