use std::env;
use std::time::Duration;

use auth::JwtError;
use auth::RateLimitConfig;
use auth::SessionConfig;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::password_reset::models::PasswordResetConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitSettings,
    pub cookies: CookieConfig,
    pub password_reset: PasswordResetSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Signing keys are base64-encoded PEM documents.
#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub private_key: String,
    pub public_key: String,
    pub issuer: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub reset_ttl_minutes: i64,
    pub registration_ttl_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("private_key", &"<redacted>")
            .field("public_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("reset_ttl_minutes", &self.reset_ttl_minutes)
            .field("registration_ttl_hours", &self.registration_ttl_hours)
            .finish()
    }
}

impl JwtConfig {
    /// # Errors
    /// * `Configuration` - Lifetimes are not positive or refresh does not outlive access
    pub fn session_config(&self) -> Result<SessionConfig, JwtError> {
        SessionConfig::new(
            chrono::Duration::minutes(self.access_ttl_minutes),
            chrono::Duration::days(self.refresh_ttl_days),
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub requests: u32,
    pub per_seconds: u64,
    pub burst: u32,
    pub idle_ttl_seconds: u64,
    pub trust_forwarded_for: bool,
}

impl RateLimitSettings {
    pub fn limiter_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests: self.requests,
            per: Duration::from_secs(self.per_seconds),
            burst: self.burst,
            idle_ttl: Duration::from_secs(self.idle_ttl_seconds),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookieConfig {
    pub secure: bool,
    pub same_site: String,
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordResetSettings {
    pub link_base_url: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__PRIVATE_KEY, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__PRIVATE_KEY=LS0tLS1CRUdJTi... overrides jwt.private_key
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }

    pub fn password_reset_config(&self) -> PasswordResetConfig {
        PasswordResetConfig {
            token_ttl: chrono::Duration::minutes(self.jwt.reset_ttl_minutes),
            registration_ttl: chrono::Duration::hours(self.jwt.registration_ttl_hours),
            link_base_url: self.password_reset.link_base_url.clone(),
        }
    }
}
