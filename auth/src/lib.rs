//! Authentication utilities library
//!
//! Provides the credential and session primitives of the geodata API:
//! - Password hashing (Argon2id)
//! - RS256 token signing and validation
//! - Session token issuance, validation and rotation
//! - Per-client token-bucket rate limiting
//!
//! The HTTP service owns persistence and transport; this crate holds no I/O.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("wrong", &hash));
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::{JwtHandler, SessionConfig, SessionTokenService, TokenKind};
//!
//! let handler = JwtHandler::new(
//!     include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/private.pem")),
//!     include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/public.pem")),
//!     "https://api.example.org",
//! )
//! .unwrap();
//! let sessions = SessionTokenService::new(handler, SessionConfig::default());
//!
//! let pair = sessions.issue("user123", "ADMIN").unwrap();
//! let claims = sessions.validate_kind(&pair.access.token, TokenKind::Access).unwrap();
//! assert_eq!(claims.sub, "user123");
//!
//! let renewed = sessions.refresh(&pair.refresh.token).unwrap();
//! assert_ne!(renewed.access.claims.jti, pair.access.claims.jti);
//! ```
//!
//! ## Rate Limiting
//! ```
//! use std::time::Duration;
//! use auth::{RateLimitConfig, RateLimiter};
//!
//! let limiter = RateLimiter::new(RateLimitConfig {
//!     requests: 1,
//!     per: Duration::from_secs(1),
//!     burst: 2,
//!     idle_ttl: Duration::from_secs(60),
//! });
//! assert!(limiter.allow(&"10.0.0.1"));
//! assert!(limiter.allow(&"10.0.0.1"));
//! assert!(!limiter.allow(&"10.0.0.1"));
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod ratelimit;
pub mod session;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use ratelimit::Admission;
pub use ratelimit::RateLimitConfig;
pub use ratelimit::RateLimiter;
pub use session::IssuedToken;
pub use session::SessionConfig;
pub use session::SessionTokenService;
pub use session::TokenPair;
