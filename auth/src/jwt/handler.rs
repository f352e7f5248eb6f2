use base64ct::Base64;
use base64ct::Encoding;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::JwtError;

const ALGORITHM: Algorithm = Algorithm::RS256;

/// JWT token handler for encoding and decoding tokens.
///
/// Generic over the claims type. Uses RS256 (RSA PKCS#1 v1.5 with SHA-256):
/// tokens are signed with the private key and verified with the public key
/// alone, so a handler built with [`JwtHandler::verifier`] can validate
/// tokens without ever holding signing material.
///
/// Decoding accepts only RS256 headers, applies zero clock leeway and
/// requires issuer and audience to equal the handler's identity.
pub struct JwtHandler {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    validation: Validation,
    identity: String,
}

impl JwtHandler {
    /// Create a signing and verifying handler from PEM key material.
    ///
    /// # Arguments
    /// * `private_pem` - RSA private key (PKCS#1 or PKCS#8 PEM)
    /// * `public_pem` - Matching RSA public key PEM
    /// * `identity` - Issuer and audience written into and expected from tokens
    ///
    /// # Errors
    /// * `Configuration` - A key could not be parsed
    pub fn new(private_pem: &[u8], public_pem: &[u8], identity: &str) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| JwtError::Configuration(format!("private key: {}", e)))?;

        let mut handler = Self::verifier(public_pem, identity)?;
        handler.encoding_key = Some(encoding_key);
        Ok(handler)
    }

    /// Create a verify-only handler from a public key PEM.
    ///
    /// # Errors
    /// * `Configuration` - The key could not be parsed
    pub fn verifier(public_pem: &[u8], identity: &str) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| JwtError::Configuration(format!("public key: {}", e)))?;

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[identity]);
        validation.set_audience(&[identity]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        Ok(Self {
            encoding_key: None,
            decoding_key,
            validation,
            identity: identity.to_string(),
        })
    }

    /// Create a signing and verifying handler from base64-encoded PEM keys,
    /// the form in which keys are carried in configuration.
    ///
    /// # Errors
    /// * `Configuration` - A key is not valid base64 or not a valid PEM
    pub fn from_base64_pem(
        private_key: &str,
        public_key: &str,
        identity: &str,
    ) -> Result<Self, JwtError> {
        let private_pem = decode_key_material("private key", private_key)?;
        let public_pem = decode_key_material("public key", public_key)?;
        Self::new(&private_pem, &public_pem, identity)
    }

    /// Issuer and audience bound to this handler.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether this handler can sign tokens.
    pub fn can_sign(&self) -> bool {
        self.encoding_key.is_some()
    }

    /// Sign claims into a JWT token.
    ///
    /// # Errors
    /// * `Configuration` - Handler has no private key
    /// * `EncodingFailed` - Serialization or signing failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let key = self.encoding_key.as_ref().ok_or_else(|| {
            JwtError::Configuration("handler was built without a private key".to_string())
        })?;

        encode(&Header::new(ALGORITHM), claims, key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a JWT token and decode its claims.
    ///
    /// # Errors
    /// * `SignatureInvalid` - Bad signature or a non-RS256 header
    /// * `ExpiredOrNotYetValid` - `exp` has passed or `nbf` is in the future
    /// * `UntrustedIssuer` - Issuer or audience differs from this handler's identity
    /// * `ClaimMissing` - A required claim is absent
    /// * `Malformed` - Token structure or claim shapes are invalid
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(JwtError::from)
    }
}

/// Decode key material from configuration.
///
/// Accepts base64 of a PEM document; a raw PEM document is passed through.
fn decode_key_material(name: &str, value: &str) -> Result<Vec<u8>, JwtError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(JwtError::Configuration(format!("{} is empty", name)));
    }
    if value.starts_with("-----BEGIN") {
        return Ok(value.as_bytes().to_vec());
    }

    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    Base64::decode_vec(&compact)
        .map_err(|e| JwtError::Configuration(format!("{} is not valid base64: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;
    use serde::Deserialize;

    use super::*;
    use crate::jwt::claims::Claims;
    use crate::jwt::claims::TokenKind;

    const PRIVATE_PEM: &[u8] = include_bytes!("../../testdata/private.pem");
    const PUBLIC_PEM: &[u8] = include_bytes!("../../testdata/public.pem");
    const OTHER_PRIVATE_PEM: &[u8] = include_bytes!("../../testdata/other_private.pem");
    const IDENTITY: &str = "https://api.example.org";

    fn handler() -> JwtHandler {
        JwtHandler::new(PRIVATE_PEM, PUBLIC_PEM, IDENTITY).expect("Failed to build handler")
    }

    fn claims_valid_for(lifetime: Duration) -> Claims {
        Claims::new("user123", "USER", TokenKind::Access, IDENTITY, Utc::now(), lifetime)
    }

    #[test]
    fn test_encode_and_decode() {
        let handler = handler();
        let claims = claims_valid_for(Duration::minutes(5));

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert_eq!(token.split('.').count(), 3);

        let decoded: Claims = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_decode_invalid_token() {
        let result = handler().decode::<Claims>("invalid.token.here");
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_decode_with_foreign_key() {
        let foreign = JwtHandler::new(OTHER_PRIVATE_PEM, PUBLIC_PEM, IDENTITY).unwrap();
        let token = foreign.encode(&claims_valid_for(Duration::minutes(5))).unwrap();

        let result = handler().decode::<Claims>(&token);
        assert_eq!(result.unwrap_err(), JwtError::SignatureInvalid);
    }

    #[test]
    fn test_decode_rejects_symmetric_algorithm() {
        // HS256 token keyed with the public key bytes, as in an algorithm-confusion attack.
        let claims = claims_valid_for(Duration::minutes(5));
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(PUBLIC_PEM),
        )
        .unwrap();

        let result = handler().decode::<Claims>(&token);
        assert_eq!(result.unwrap_err(), JwtError::SignatureInvalid);
    }

    #[test]
    fn test_decode_expired_token() {
        let mut claims = claims_valid_for(Duration::minutes(5));
        claims.iat -= 600;
        claims.nbf -= 600;
        claims.exp = Utc::now().timestamp() - 1;

        let handler = handler();
        let token = handler.encode(&claims).unwrap();

        let result = handler.decode::<Claims>(&token);
        assert_eq!(result.unwrap_err(), JwtError::ExpiredOrNotYetValid);
    }

    #[test]
    fn test_decode_not_yet_valid_token() {
        let mut claims = claims_valid_for(Duration::minutes(5));
        claims.nbf = Utc::now().timestamp() + 120;

        let handler = handler();
        let token = handler.encode(&claims).unwrap();

        let result = handler.decode::<Claims>(&token);
        assert_eq!(result.unwrap_err(), JwtError::ExpiredOrNotYetValid);
    }

    #[test]
    fn test_decode_foreign_issuer() {
        let mut claims = claims_valid_for(Duration::minutes(5));
        claims.iss = "https://elsewhere.example.org".to_string();

        let handler = handler();
        let token = handler.encode(&claims).unwrap();

        let result = handler.decode::<Claims>(&token);
        assert_eq!(result.unwrap_err(), JwtError::UntrustedIssuer);
    }

    #[test]
    fn test_decode_missing_claim() {
        #[derive(Serialize, Deserialize)]
        struct WithoutRole {
            sub: String,
            jti: String,
            iat: i64,
            nbf: i64,
            exp: i64,
            iss: String,
            aud: String,
            #[serde(rename = "type")]
            kind: TokenKind,
        }

        let now = Utc::now().timestamp();
        let partial = WithoutRole {
            sub: "user123".to_string(),
            jti: "abc".to_string(),
            iat: now,
            nbf: now,
            exp: now + 300,
            iss: IDENTITY.to_string(),
            aud: IDENTITY.to_string(),
            kind: TokenKind::Access,
        };

        let handler = handler();
        let token = handler.encode(&partial).unwrap();

        let result = handler.decode::<Claims>(&token);
        assert_eq!(result.unwrap_err(), JwtError::ClaimMissing("role".to_string()));
    }

    #[test]
    fn test_verifier_cannot_sign() {
        let verifier = JwtHandler::verifier(PUBLIC_PEM, IDENTITY).unwrap();
        assert!(!verifier.can_sign());

        let result = verifier.encode(&claims_valid_for(Duration::minutes(5)));
        assert!(matches!(result, Err(JwtError::Configuration(_))));
    }

    #[test]
    fn test_verifier_validates_signed_tokens() {
        let token = handler()
            .encode(&claims_valid_for(Duration::minutes(5)))
            .unwrap();

        let verifier = JwtHandler::verifier(PUBLIC_PEM, IDENTITY).unwrap();
        let decoded: Claims = verifier.decode(&token).unwrap();
        assert_eq!(decoded.sub, "user123");
    }

    #[test]
    fn test_from_base64_pem() {
        let private_key = Base64::encode_string(PRIVATE_PEM);
        let public_key = Base64::encode_string(PUBLIC_PEM);

        let handler = JwtHandler::from_base64_pem(&private_key, &public_key, IDENTITY)
            .expect("Failed to build handler from base64 keys");
        assert!(handler.can_sign());
        assert_eq!(handler.identity(), IDENTITY);
    }

    #[test]
    fn test_from_base64_pem_rejects_garbage() {
        let public_key = Base64::encode_string(PUBLIC_PEM);

        let not_base64 = JwtHandler::from_base64_pem("%%%not base64%%%", &public_key, IDENTITY);
        assert!(matches!(not_base64, Err(JwtError::Configuration(_))));

        let not_pem = Base64::encode_string(b"definitely not a key");
        let result = JwtHandler::from_base64_pem(&not_pem, &public_key, IDENTITY);
        assert!(matches!(result, Err(JwtError::Configuration(_))));

        let empty = JwtHandler::from_base64_pem("", &public_key, IDENTITY);
        assert!(matches!(empty, Err(JwtError::Configuration(_))));
    }
}
