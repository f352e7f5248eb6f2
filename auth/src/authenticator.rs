use crate::jwt::JwtError;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::session::SessionTokenService;
use crate::session::TokenPair;

/// Authentication coordinator combining password verification and session issuance.
///
/// Holds a precomputed decoy hash so that a login attempt for an unknown
/// account costs the same Argon2 work as one for a known account.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    sessions: SessionTokenService,
    decoy_hash: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("JWT error: {0}")]
    Jwt(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator issuing sessions through `sessions`.
    ///
    /// # Errors
    /// * `HashingFailed` - Decoy hash could not be computed
    pub fn new(sessions: SessionTokenService) -> Result<Self, PasswordError> {
        let password_hasher = PasswordHasher::new();
        let decoy_hash = password_hasher.hash("decoy-password-never-matches")?;

        Ok(Self {
            password_hasher,
            sessions,
            decoy_hash,
        })
    }

    pub fn sessions(&self) -> &SessionTokenService {
        &self.sessions
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against its stored hash and issue a token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match or the hash is malformed
    /// * `Jwt` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
        role: &str,
    ) -> Result<TokenPair, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.sessions.issue(subject, role)?)
    }

    /// Burn one verification against the decoy hash. Always fails.
    pub fn verify_decoy(&self, password: &str) -> AuthenticationError {
        let _ = self.password_hasher.verify(password, &self.decoy_hash);
        AuthenticationError::InvalidCredentials
    }
}
