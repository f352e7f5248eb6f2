use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::RateLimiter;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::cookies::CookieSettings;
use super::handlers::api_keys::create_api_key;
use super::handlers::api_keys::delete_api_key;
use super::handlers::api_keys::list_api_keys;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::profile::profile;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::handlers::reset_password::reset_password;
use super::handlers::set_password::set_password;
use super::middleware::authenticate as auth_middleware;
use super::middleware::rate_limit;
use crate::domain::api_key::ports::ApiKeyServicePort;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::password_reset::ports::PasswordResetServicePort;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub password_reset_service: Arc<dyn PasswordResetServicePort>,
    pub api_key_service: Arc<dyn ApiKeyServicePort>,
    pub rate_limiter: Option<Arc<RateLimiter<IpAddr>>>,
    pub trust_forwarded_for: bool,
    pub cookies: CookieSettings,
}

/// Transport settings for the HTTP surface.
#[derive(Clone, Default)]
pub struct HttpSettings {
    pub rate_limiter: Option<Arc<RateLimiter<IpAddr>>>,
    pub trust_forwarded_for: bool,
    pub cookies: CookieSettings,
}

pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    password_reset_service: Arc<dyn PasswordResetServicePort>,
    api_key_service: Arc<dyn ApiKeyServicePort>,
    settings: HttpSettings,
) -> Router {
    let state = AppState {
        auth_service,
        password_reset_service,
        api_key_service,
        rate_limiter: settings.rate_limiter,
        trust_forwarded_for: settings.trust_forwarded_for,
        cookies: settings.cookies,
    };

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/register", post(register))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/set-password", post(set_password));

    let protected_routes = Router::new()
        .route("/auth/profile", get(profile))
        .route("/api-keys", get(list_api_keys).post(create_api_key))
        .route("/api-keys/:id", delete(delete_api_key))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .nest("/v1", api_routes)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
        .with_state(state)
}
