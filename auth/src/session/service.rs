use chrono::Duration;
use chrono::Utc;

use super::config::SessionConfig;
use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenKind;

/// A signed token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Access and refresh tokens minted by one `issue` call for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Issues, validates and rotates stateless session tokens.
///
/// No server-side session record exists: a token stays usable until its
/// `exp`, including a refresh token that has already been rotated.
pub struct SessionTokenService {
    handler: JwtHandler,
    config: SessionConfig,
}

impl SessionTokenService {
    pub fn new(handler: JwtHandler, config: SessionConfig) -> Self {
        Self { handler, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mint an access and refresh token for a subject.
    ///
    /// # Errors
    /// * `Configuration` - Underlying handler cannot sign
    /// * `EncodingFailed` - Signing failed
    pub fn issue(&self, subject: &str, role: &str) -> Result<TokenPair, JwtError> {
        let access = self.mint(subject, role, TokenKind::Access, self.config.access_ttl())?;
        let refresh = self.mint(subject, role, TokenKind::Refresh, self.config.refresh_ttl())?;

        tracing::debug!(
            subject = %subject,
            access_jti = %access.claims.jti,
            refresh_jti = %refresh.claims.jti,
            "Token pair issued"
        );

        Ok(TokenPair { access, refresh })
    }

    /// Mint a single token of the given kind valid from now for `lifetime`.
    pub fn mint(
        &self,
        subject: &str,
        role: &str,
        kind: TokenKind,
        lifetime: Duration,
    ) -> Result<IssuedToken, JwtError> {
        let claims = Claims::new(
            subject,
            role,
            kind,
            self.handler.identity(),
            Utc::now(),
            lifetime,
        );
        let token = self.handler.encode(&claims)?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature, time window, issuer and the full claim set.
    ///
    /// The token kind is not checked here; see [`Self::validate_kind`].
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        self.handler.decode::<Claims>(token)
    }

    /// Validate a token and require its `type` claim to equal `expected`.
    ///
    /// # Errors
    /// * `KindMismatch` - Token is valid but of another kind
    /// * Any error of [`Self::validate`]
    pub fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let claims = self.validate(token)?;

        if claims.kind != expected {
            return Err(JwtError::KindMismatch {
                expected,
                actual: claims.kind,
            });
        }

        Ok(claims)
    }

    /// Exchange a refresh token for a new token pair for the same subject and role.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, JwtError> {
        let claims = self.validate_kind(refresh_token, TokenKind::Refresh)?;
        self.issue(&claims.sub, &claims.role)
    }
}
