use auth::IssuedToken;
use auth::TokenPair;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::cookie::SameSite;

use crate::config::CookieConfig;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const LOGGED_IN_COOKIE: &str = "logged_in";

/// Attributes shared by every session cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub same_site: SameSite,
    pub domain: Option<String>,
}

impl CookieSettings {
    /// Only `lax` relaxes the policy; any other value, `none` included, gives `Strict`.
    pub fn from_config(config: &CookieConfig) -> Self {
        let same_site = match config.same_site.to_ascii_lowercase().as_str() {
            "lax" => SameSite::Lax,
            _ => SameSite::Strict,
        };

        Self {
            secure: config.secure,
            same_site,
            domain: config.domain.clone().filter(|domain| !domain.is_empty()),
        }
    }

    fn build(
        &self,
        name: &'static str,
        value: String,
        http_only: bool,
        max_age_secs: i64,
    ) -> Cookie<'static> {
        let mut cookie = Cookie::build((name, value))
            .path("/")
            .http_only(http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(time::Duration::seconds(max_age_secs.max(0)));

        if let Some(domain) = &self.domain {
            cookie = cookie.domain(domain.clone());
        }

        cookie.build()
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: SameSite::Strict,
            domain: None,
        }
    }
}

fn lifetime_secs(token: &IssuedToken) -> i64 {
    token.claims.exp - token.claims.iat
}

/// Set the access, refresh and `logged_in` cookies for a token pair.
pub fn with_session(jar: CookieJar, tokens: &TokenPair, settings: &CookieSettings) -> CookieJar {
    let access_lifetime = lifetime_secs(&tokens.access);

    jar.add(settings.build(
        ACCESS_TOKEN_COOKIE,
        tokens.access.token.clone(),
        true,
        access_lifetime,
    ))
    .add(settings.build(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh.token.clone(),
        true,
        lifetime_secs(&tokens.refresh),
    ))
    .add(settings.build(LOGGED_IN_COOKIE, "true".to_string(), false, access_lifetime))
}

/// Expire all session cookies on the client.
pub fn without_session(jar: CookieJar, settings: &CookieSettings) -> CookieJar {
    jar.add(settings.build(ACCESS_TOKEN_COOKIE, String::new(), true, 0))
        .add(settings.build(REFRESH_TOKEN_COOKIE, String::new(), true, 0))
        .add(settings.build(LOGGED_IN_COOKIE, String::new(), false, 0))
}
