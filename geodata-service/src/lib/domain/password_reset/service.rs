use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::TokenKind;
use chrono::Utc;
use serde_json::json;

use crate::domain::email::models::EmailMessage;
use crate::domain::password_reset::errors::PasswordResetError;
use crate::domain::password_reset::models::PasswordReset;
use crate::domain::password_reset::models::PasswordResetConfig;
use crate::domain::password_reset::ports::PasswordResetRepository;
use crate::domain::password_reset::ports::PasswordResetServicePort;
use crate::domain::password_reset::ports::PendingReset;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserStatus;
use crate::domain::user::ports::UserRepository;

pub const RESET_EMAIL_TEMPLATE: &str = "password_reset";
pub const RESET_EMAIL_SUBJECT: &str = "Reset your password";
pub const REGISTRATION_EMAIL_TEMPLATE: &str = "registration";
pub const REGISTRATION_EMAIL_SUBJECT: &str = "Complete your registration";

/// Domain service implementation for the password-reset flow.
pub struct PasswordResetService<UR, PR>
where
    UR: UserRepository,
    PR: PasswordResetRepository,
{
    users: Arc<UR>,
    resets: Arc<PR>,
    authenticator: Arc<Authenticator>,
    config: PasswordResetConfig,
}

impl<UR, PR> PasswordResetService<UR, PR>
where
    UR: UserRepository,
    PR: PasswordResetRepository,
{
    pub fn new(
        users: Arc<UR>,
        resets: Arc<PR>,
        authenticator: Arc<Authenticator>,
        config: PasswordResetConfig,
    ) -> Self {
        Self {
            users,
            resets,
            authenticator,
            config,
        }
    }

    fn mint_reset_token(
        &self,
        user: &User,
        ttl: chrono::Duration,
    ) -> Result<String, PasswordResetError> {
        let issued = self.authenticator.sessions().mint(
            &user.id.to_string(),
            user.role.as_str(),
            TokenKind::PasswordReset,
            ttl,
        )?;
        Ok(issued.token)
    }

    /// Enqueue `message` on the pending transaction and commit both.
    ///
    /// On failure `pending` is dropped and its transaction rolls back.
    async fn deliver(
        &self,
        mut pending: Box<dyn PendingReset>,
        message: EmailMessage,
    ) -> Result<(), PasswordResetError> {
        if let Err(e) = pending.enqueue_email(&message).await {
            tracing::error!(
                user_id = %pending.reset().user_id,
                template = %message.template,
                error = %e,
                "Email not enqueued"
            );
            return Err(e);
        }

        pending.commit().await
    }
}

#[async_trait]
impl<UR, PR> PasswordResetServicePort for PasswordResetService<UR, PR>
where
    UR: UserRepository,
    PR: PasswordResetRepository,
{
    async fn initiate(&self, email: &str) -> Result<String, PasswordResetError> {
        let email = EmailAddress::new(email)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(PasswordResetError::UnknownEmail)?;

        let token = self.mint_reset_token(&user, self.config.token_ttl)?;

        let pending = self
            .resets
            .begin_issue(PasswordReset::new(user.id, token.clone()))
            .await?;
        let reset_id = pending.reset().id;

        let message = EmailMessage {
            to: user.email.clone(),
            subject: RESET_EMAIL_SUBJECT.to_string(),
            template: RESET_EMAIL_TEMPLATE.to_string(),
            data: json!({
                "link": self.config.reset_link(&token),
                "expires_in_minutes": self.config.token_ttl.num_minutes(),
            }),
        };

        self.deliver(pending, message).await?;

        tracing::info!(user_id = %user.id, reset_id = %reset_id, "Password reset issued");

        Ok(token)
    }

    async fn register(&self, email: &str) -> Result<(User, String), PasswordResetError> {
        let email = EmailAddress::new(email)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(PasswordResetError::EmailTaken);
        }

        let user = User {
            id: UserId::new(),
            email,
            password_hash: None,
            status: UserStatus::Inactive,
            role: Role::User,
            created_at: Utc::now(),
        };

        let token = self.mint_reset_token(&user, self.config.registration_ttl)?;

        let pending = self
            .resets
            .begin_registration(&user, PasswordReset::new(user.id, token.clone()))
            .await?;

        let message = EmailMessage {
            to: user.email.clone(),
            subject: REGISTRATION_EMAIL_SUBJECT.to_string(),
            template: REGISTRATION_EMAIL_TEMPLATE.to_string(),
            data: json!({
                "link": self.config.reset_link(&token),
                "expires_in_hours": self.config.registration_ttl.num_hours(),
            }),
        };

        self.deliver(pending, message).await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok((user, token))
    }

    async fn consume(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), PasswordResetError> {
        if new_password != confirm_password {
            return Err(PasswordResetError::PasswordMismatch);
        }
        if new_password.chars().count() < PasswordResetConfig::MIN_PASSWORD_LENGTH {
            return Err(PasswordResetError::PasswordTooShort {
                min: PasswordResetConfig::MIN_PASSWORD_LENGTH,
            });
        }

        let claims = self
            .authenticator
            .sessions()
            .validate_kind(token, TokenKind::PasswordReset)?;

        let reset = self
            .resets
            .find_by_token(token)
            .await?
            .ok_or(PasswordResetError::UnknownToken)?;

        if !reset.is_active() {
            return Err(PasswordResetError::AlreadyConsumed);
        }
        if reset.user_id.to_string() != claims.sub {
            tracing::warn!(reset_id = %reset.id, "Reset token subject does not own the record");
            return Err(PasswordResetError::UnknownToken);
        }

        let password_hash = self.authenticator.hash_password(new_password)?;
        self.resets.consume(&reset, &password_hash).await?;

        tracing::info!(user_id = %reset.user_id, reset_id = %reset.id, "Password reset consumed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    use auth::JwtHandler;
    use auth::SessionConfig;
    use auth::SessionTokenService;
    use chrono::Duration;
    use mockall::mock;

    use super::*;
    use crate::domain::email::errors::EmailDeliveryError;
    use crate::domain::password_reset::models::ResetStatus;
    use crate::domain::user::errors::UserError;

    const PRIVATE_PEM: &[u8] = include_bytes!("../../../../../auth/testdata/private.pem");
    const PUBLIC_PEM: &[u8] = include_bytes!("../../../../../auth/testdata/public.pem");

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;
        }
    }

    mock! {
        pub TestResetRepository {}

        #[async_trait]
        impl PasswordResetRepository for TestResetRepository {
            async fn begin_issue(&self, reset: PasswordReset) -> Result<Box<dyn PendingReset>, PasswordResetError>;
            async fn begin_registration(&self, user: &User, reset: PasswordReset) -> Result<Box<dyn PendingReset>, PasswordResetError>;
            async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>, PasswordResetError>;
            async fn consume(&self, reset: &PasswordReset, password_hash: &str) -> Result<(), PasswordResetError>;
        }
    }

    /// Observations shared between a test and the pending transactions it hands out.
    #[derive(Clone, Default)]
    struct Transaction {
        enqueued: Arc<Mutex<Vec<EmailMessage>>>,
        committed: Arc<AtomicBool>,
        fail_enqueue: bool,
    }

    impl Transaction {
        fn failing() -> Self {
            Self {
                fail_enqueue: true,
                ..Self::default()
            }
        }

        fn pending(&self, reset: PasswordReset) -> Box<dyn PendingReset> {
            Box::new(RecordingPendingReset {
                reset,
                transaction: self.clone(),
            })
        }

        fn committed(&self) -> bool {
            self.committed.load(Ordering::SeqCst)
        }

        fn enqueued(&self) -> Vec<EmailMessage> {
            self.enqueued.lock().unwrap().clone()
        }
    }

    struct RecordingPendingReset {
        reset: PasswordReset,
        transaction: Transaction,
    }

    #[async_trait]
    impl PendingReset for RecordingPendingReset {
        fn reset(&self) -> &PasswordReset {
            &self.reset
        }

        async fn enqueue_email(&mut self, message: &EmailMessage) -> Result<(), PasswordResetError> {
            if self.transaction.fail_enqueue {
                return Err(EmailDeliveryError::EnqueueFailed("outbox down".to_string()).into());
            }
            self.transaction.enqueued.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn commit(self: Box<Self>) -> Result<(), PasswordResetError> {
            self.transaction.committed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        let handler = JwtHandler::new(PRIVATE_PEM, PUBLIC_PEM, "https://api.example.org").unwrap();
        Arc::new(
            Authenticator::new(SessionTokenService::new(handler, SessionConfig::default()))
                .unwrap(),
        )
    }

    fn config() -> PasswordResetConfig {
        PasswordResetConfig {
            token_ttl: Duration::minutes(60),
            registration_ttl: Duration::hours(24),
            link_base_url: "https://admin.example.org/set-password".to_string(),
        }
    }

    fn provisioned_user() -> User {
        User {
            id: UserId::new(),
            email: EmailAddress::new("user@example.com").unwrap(),
            password_hash: None,
            status: UserStatus::Inactive,
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    fn service(
        users: MockTestUserRepository,
        resets: MockTestResetRepository,
        authenticator: Arc<Authenticator>,
    ) -> PasswordResetService<MockTestUserRepository, MockTestResetRepository> {
        PasswordResetService::new(Arc::new(users), Arc::new(resets), authenticator, config())
    }

    #[tokio::test]
    async fn test_initiate_persists_and_emails_link_in_one_transaction() {
        let user = provisioned_user();
        let user_id = user.id;
        let mut users = MockTestUserRepository::new();
        let mut resets = MockTestResetRepository::new();
        let transaction = Transaction::default();

        users
            .expect_find_by_email()
            .withf(|email| email.as_str() == "user@example.com")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let handle = transaction.clone();
        resets
            .expect_begin_issue()
            .withf(move |reset| reset.user_id == user_id && reset.status == ResetStatus::Active)
            .times(1)
            .returning(move |reset| Ok(handle.pending(reset)));

        let authenticator = authenticator();
        let service = service(users, resets, Arc::clone(&authenticator));

        let token = service.initiate(" User@Example.com ").await.unwrap();

        assert!(transaction.committed());
        let enqueued = transaction.enqueued();
        assert_eq!(enqueued.len(), 1);
        assert_eq!(enqueued[0].template, RESET_EMAIL_TEMPLATE);
        assert_eq!(enqueued[0].to.as_str(), "user@example.com");
        assert_eq!(
            enqueued[0].data["link"],
            format!("https://admin.example.org/set-password?token={}", token)
        );

        let claims = authenticator
            .sessions()
            .validate_kind(&token, TokenKind::PasswordReset)
            .unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[tokio::test]
    async fn test_initiate_unknown_email_touches_nothing() {
        let mut users = MockTestUserRepository::new();
        let mut resets = MockTestResetRepository::new();

        users.expect_find_by_email().times(1).returning(|_| Ok(None));
        resets.expect_begin_issue().times(0);

        let service = service(users, resets, authenticator());

        let result = service.initiate("nobody@example.com").await;
        assert!(matches!(result, Err(PasswordResetError::UnknownEmail)));
    }

    #[tokio::test]
    async fn test_initiate_enqueue_failure_does_not_commit() {
        let user = provisioned_user();
        let mut users = MockTestUserRepository::new();
        let mut resets = MockTestResetRepository::new();
        let transaction = Transaction::failing();

        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let handle = transaction.clone();
        resets
            .expect_begin_issue()
            .times(1)
            .returning(move |reset| Ok(handle.pending(reset)));

        let service = service(users, resets, authenticator());

        let result = service.initiate("user@example.com").await;
        assert!(matches!(result, Err(PasswordResetError::Email(_))));
        assert!(!transaction.committed());
    }

    #[tokio::test]
    async fn test_register_creates_inactive_user_with_set_password_link() {
        let mut users = MockTestUserRepository::new();
        let mut resets = MockTestResetRepository::new();
        let transaction = Transaction::default();

        users.expect_find_by_email().times(1).returning(|_| Ok(None));

        let handle = transaction.clone();
        resets
            .expect_begin_registration()
            .withf(|user, reset| {
                user.status == UserStatus::Inactive
                    && user.role == Role::User
                    && user.password_hash.is_none()
                    && reset.user_id == user.id
            })
            .times(1)
            .returning(move |_, reset| Ok(handle.pending(reset)));
        resets.expect_begin_issue().times(0);

        let authenticator = authenticator();
        let service = service(users, resets, Arc::clone(&authenticator));

        let (user, token) = service.register("New.User@Example.com").await.unwrap();

        assert_eq!(user.email.as_str(), "new.user@example.com");
        assert!(transaction.committed());

        let enqueued = transaction.enqueued();
        assert_eq!(enqueued.len(), 1);
        assert_eq!(enqueued[0].template, REGISTRATION_EMAIL_TEMPLATE);
        assert_eq!(enqueued[0].data["expires_in_hours"], 24);

        let claims = authenticator
            .sessions()
            .validate_kind(&token, TokenKind::PasswordReset)
            .unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, "USER");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let existing = provisioned_user();
        let mut users = MockTestUserRepository::new();
        let mut resets = MockTestResetRepository::new();

        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        resets.expect_begin_registration().times(0);

        let service = service(users, resets, authenticator());

        let result = service.register("user@example.com").await;
        assert!(matches!(result, Err(PasswordResetError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_register_enqueue_failure_does_not_commit() {
        let mut users = MockTestUserRepository::new();
        let mut resets = MockTestResetRepository::new();
        let transaction = Transaction::failing();

        users.expect_find_by_email().returning(|_| Ok(None));
        let handle = transaction.clone();
        resets
            .expect_begin_registration()
            .returning(move |_, reset| Ok(handle.pending(reset)));

        let service = service(users, resets, authenticator());

        let result = service.register("user@example.com").await;
        assert!(matches!(result, Err(PasswordResetError::Email(_))));
        assert!(!transaction.committed());
    }

    #[tokio::test]
    async fn test_consume_mismatch_has_no_side_effects() {
        let mut users = MockTestUserRepository::new();
        let mut resets = MockTestResetRepository::new();

        users.expect_find_by_email().times(0);
        users.expect_find_by_id().times(0);
        resets.expect_begin_issue().times(0);
        resets.expect_find_by_token().times(0);
        resets.expect_consume().times(0);

        let service = service(users, resets, authenticator());

        let result = service.consume("any-token", "NewPass123", "NewPass124").await;
        assert!(matches!(result, Err(PasswordResetError::PasswordMismatch)));
    }

    #[tokio::test]
    async fn test_consume_rejects_short_password() {
        let mut resets = MockTestResetRepository::new();
        resets.expect_find_by_token().times(0);
        resets.expect_consume().times(0);

        let service = service(MockTestUserRepository::new(), resets, authenticator());

        let result = service.consume("any-token", "short", "short").await;
        assert!(matches!(
            result,
            Err(PasswordResetError::PasswordTooShort { min: 8 })
        ));
    }

    #[tokio::test]
    async fn test_consume_rejects_session_token() {
        let authenticator = authenticator();
        let pair = authenticator.sessions().issue("user-1", "USER").unwrap();

        let mut resets = MockTestResetRepository::new();
        resets.expect_find_by_token().times(0);
        resets.expect_consume().times(0);

        let service = service(MockTestUserRepository::new(), resets, authenticator);

        let result = service
            .consume(&pair.access.token, "NewPass123", "NewPass123")
            .await;
        assert!(matches!(result, Err(PasswordResetError::Token(_))));
    }

    #[tokio::test]
    async fn test_consume_twice_applies_once() {
        let authenticator = authenticator();
        let user_id = UserId::new();
        let issued = authenticator
            .sessions()
            .mint(
                &user_id.to_string(),
                "USER",
                TokenKind::PasswordReset,
                Duration::minutes(60),
            )
            .unwrap();

        let record = Arc::new(Mutex::new(PasswordReset::new(user_id, issued.token.clone())));
        let stored_hashes = Arc::new(Mutex::new(Vec::<String>::new()));

        let mut resets = MockTestResetRepository::new();
        let lookup = Arc::clone(&record);
        resets
            .expect_find_by_token()
            .times(2)
            .returning(move |_| Ok(Some(lookup.lock().unwrap().clone())));

        let consumed = Arc::clone(&record);
        let hashes = Arc::clone(&stored_hashes);
        resets
            .expect_consume()
            .times(1)
            .returning(move |_, password_hash| {
                consumed.lock().unwrap().status = ResetStatus::Inactive;
                hashes.lock().unwrap().push(password_hash.to_string());
                Ok(())
            });

        let service = service(
            MockTestUserRepository::new(),
            resets,
            Arc::clone(&authenticator),
        );

        service
            .consume(&issued.token, "NewPass123", "NewPass123")
            .await
            .unwrap();
        let second = service
            .consume(&issued.token, "OtherPass456", "OtherPass456")
            .await;

        assert!(matches!(second, Err(PasswordResetError::AlreadyConsumed)));
        let hashes = stored_hashes.lock().unwrap();
        assert_eq!(hashes.len(), 1);
        assert!(auth::PasswordHasher::new().verify("NewPass123", &hashes[0]));
    }

    #[tokio::test]
    async fn test_consume_rejects_record_of_other_user() {
        let authenticator = authenticator();
        let issued = authenticator
            .sessions()
            .mint(
                &UserId::new().to_string(),
                "USER",
                TokenKind::PasswordReset,
                Duration::minutes(60),
            )
            .unwrap();
        let foreign_record = PasswordReset::new(UserId::new(), issued.token.clone());

        let mut resets = MockTestResetRepository::new();
        resets
            .expect_find_by_token()
            .returning(move |_| Ok(Some(foreign_record.clone())));
        resets.expect_consume().times(0);

        let service = service(MockTestUserRepository::new(), resets, authenticator);

        let result = service
            .consume(&issued.token, "NewPass123", "NewPass123")
            .await;
        assert!(matches!(result, Err(PasswordResetError::UnknownToken)));
    }
}
