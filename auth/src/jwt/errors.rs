use thiserror::Error;

use super::claims::TokenKind;

/// Error type for token operations.
///
/// The variants exist for logging and tests. Every one except
/// `Configuration` and `EncodingFailed` must reach clients as the same
/// opaque "unauthorized" outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Invalid key configuration: {0}")]
    Configuration(String),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token is expired or not yet valid")]
    ExpiredOrNotYetValid,

    #[error("Missing required claim: {0}")]
    ClaimMissing(String),

    #[error("Unexpected token type: expected {expected}, got {actual}")]
    KindMismatch {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("Token issuer or audience is not trusted")]
    UntrustedIssuer,
}

impl JwtError {
    /// Whether this error stems from the presented credential.
    pub fn is_unauthorized(&self) -> bool {
        !matches!(
            self,
            JwtError::Configuration(_) | JwtError::EncodingFailed(_)
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => JwtError::SignatureInvalid,
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                JwtError::ExpiredOrNotYetValid
            }
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => JwtError::UntrustedIssuer,
            ErrorKind::MissingRequiredClaim(claim) => JwtError::ClaimMissing(claim.clone()),
            ErrorKind::Json(json_err) => match missing_field(&json_err.to_string()) {
                Some(field) => JwtError::ClaimMissing(field),
                None => JwtError::Malformed(json_err.to_string()),
            },
            ErrorKind::InvalidRsaKey(msg) => JwtError::Configuration(msg.clone()),
            ErrorKind::InvalidKeyFormat => JwtError::Configuration(err.to_string()),
            _ => JwtError::Malformed(err.to_string()),
        }
    }
}

/// Extract the field name from serde's "missing field `name`" message.
fn missing_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}
