use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;
use auth::JwtHandler;
use auth::RateLimitConfig;
use auth::RateLimiter;
use auth::SessionConfig;
use auth::SessionTokenService;
use chrono::Utc;
use geodata_service::domain::api_key::errors::ApiKeyError;
use geodata_service::domain::api_key::models::ApiKey;
use geodata_service::domain::api_key::models::ApiKeyId;
use geodata_service::domain::api_key::ports::ApiKeyRepository;
use geodata_service::domain::api_key::service::ApiKeyService;
use geodata_service::domain::auth::service::AuthService;
use geodata_service::domain::email::errors::EmailDeliveryError;
use geodata_service::domain::email::models::EmailMessage;
use geodata_service::domain::password_reset::errors::PasswordResetError;
use geodata_service::domain::password_reset::models::PasswordReset;
use geodata_service::domain::password_reset::models::PasswordResetConfig;
use geodata_service::domain::password_reset::models::ResetStatus;
use geodata_service::domain::password_reset::ports::PasswordResetRepository;
use geodata_service::domain::password_reset::ports::PendingReset;
use geodata_service::domain::password_reset::service::PasswordResetService;
use geodata_service::domain::user::errors::UserError;
use geodata_service::domain::user::models::EmailAddress;
use geodata_service::domain::user::models::Role;
use geodata_service::domain::user::models::User;
use geodata_service::domain::user::models::UserId;
use geodata_service::domain::user::models::UserStatus;
use geodata_service::domain::user::ports::UserRepository;
use geodata_service::inbound::http::cookies::CookieSettings;
use geodata_service::inbound::http::router::create_router;
use geodata_service::inbound::http::router::HttpSettings;
use uuid::Uuid;

const PRIVATE_KEY: &[u8] = include_bytes!("../../../auth/testdata/private.pem");
const PUBLIC_KEY: &[u8] = include_bytes!("../../../auth/testdata/public.pem");
const ISSUER: &str = "https://geodata.test";

pub const PASSWORD: &str = "correct horse battery";

/// Shared in-memory state behind every test adapter.
#[derive(Default)]
pub struct Store {
    pub users: HashMap<UserId, User>,
    pub api_keys: Vec<ApiKey>,
    pub resets: Vec<PasswordReset>,
    pub outbox: Vec<EmailMessage>,
    pub fail_email: bool,
}

pub type SharedStore = Arc<Mutex<Store>>;

/// Test application that spawns a real server over in-memory adapters
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: SharedStore,
    pub api_client: reqwest::Client,
    pub authenticator: Arc<Authenticator>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with(None).await
    }

    pub async fn spawn_with_rate_limit(config: RateLimitConfig) -> Self {
        Self::spawn_with(Some(config)).await
    }

    async fn spawn_with(rate_limit: Option<RateLimitConfig>) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let handler =
            JwtHandler::new(PRIVATE_KEY, PUBLIC_KEY, ISSUER).expect("Failed to load test keys");
        let sessions = SessionTokenService::new(handler, SessionConfig::default());
        let authenticator =
            Arc::new(Authenticator::new(sessions).expect("Failed to create authenticator"));

        let store = SharedStore::default();
        let users = Arc::new(InMemoryUsers(Arc::clone(&store)));

        let api_keys = Arc::new(InMemoryApiKeys(Arc::clone(&store)));

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&users),
            Arc::clone(&api_keys),
            Arc::clone(&authenticator),
        ));
        let api_key_service = Arc::new(ApiKeyService::new(api_keys));
        let password_reset_service = Arc::new(PasswordResetService::new(
            users,
            Arc::new(InMemoryResets(Arc::clone(&store))),
            Arc::clone(&authenticator),
            PasswordResetConfig {
                token_ttl: chrono::Duration::minutes(
                    PasswordResetConfig::DEFAULT_TOKEN_TTL_MINUTES,
                ),
                registration_ttl: chrono::Duration::hours(
                    PasswordResetConfig::DEFAULT_REGISTRATION_TTL_HOURS,
                ),
                link_base_url: "http://localhost:3000/set-password".to_string(),
            },
        ));

        let settings = HttpSettings {
            rate_limiter: rate_limit.map(|config| Arc::new(RateLimiter::new(config))),
            trust_forwarded_for: false,
            cookies: CookieSettings {
                secure: false,
                ..CookieSettings::default()
            },
        };

        let router = create_router(
            auth_service,
            password_reset_service,
            api_key_service,
            settings,
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server error");
        });

        Self {
            address,
            port,
            store,
            api_client: reqwest::Client::new(),
            authenticator,
        }
    }

    /// Insert a user whose password is [`PASSWORD`].
    pub fn seed_user(&self, email: &str, role: Role, status: UserStatus) -> User {
        let password_hash = self
            .authenticator
            .hash_password(PASSWORD)
            .expect("Failed to hash password");

        let user = User {
            id: UserId::new(),
            email: EmailAddress::new(email).expect("Invalid email"),
            password_hash: Some(password_hash),
            status,
            role,
            created_at: Utc::now(),
        };

        self.store
            .lock()
            .unwrap()
            .users
            .insert(user.id, user.clone());
        user
    }

    pub fn seed_api_key(&self, owner: &User, key: &str) -> ApiKey {
        let api_key = ApiKey {
            id: ApiKeyId(Uuid::new_v4()),
            user_id: owner.id,
            name: "integration".to_string(),
            key: key.to_string(),
            owner_role: owner.role,
            last_used_at: None,
            expires_at: None,
            usage_count: 0,
            is_active: true,
            created_at: Utc::now(),
        };

        self.store.lock().unwrap().api_keys.push(api_key.clone());
        api_key
    }

    pub fn user(&self, id: &UserId) -> User {
        self.store.lock().unwrap().users[id].clone()
    }

    pub fn outbox(&self) -> Vec<EmailMessage> {
        self.store.lock().unwrap().outbox.clone()
    }

    /// Reset emails are issued off the response path; poll until `count`
    /// messages are committed or a second has passed.
    pub async fn wait_for_outbox(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..100 {
            let outbox = self.outbox();
            if outbox.len() >= count {
                return outbox;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.outbox()
    }

    /// Wait for reset requests still running in the background.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.store
            .lock()
            .unwrap()
            .users
            .values()
            .find(|user| user.email.as_str() == email)
            .cloned()
    }

    pub fn api_keys(&self) -> Vec<ApiKey> {
        self.store.lock().unwrap().api_keys.clone()
    }

    pub fn resets(&self) -> Vec<PasswordReset> {
        self.store.lock().unwrap().resets.clone()
    }

    pub fn fail_email_delivery(&self) {
        self.store.lock().unwrap().fail_email = true;
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make DELETE request
    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.delete(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// POST credentials to the login endpoint.
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/v1/auth/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Value of the `Set-Cookie` header for `name`, if the response sets one.
pub fn set_cookie(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .map(str::to_string)
}

/// Cookie value from a `Set-Cookie` header line.
pub fn cookie_value(header: &str) -> &str {
    header
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value)
        .unwrap_or_default()
}

/// Token carried by the link of a reset email.
pub fn token_from_link(message: &EmailMessage) -> String {
    let link = message.data["link"].as_str().expect("link missing");
    link.split_once("token=")
        .map(|(_, token)| token.to_string())
        .expect("token missing from link")
}

pub struct InMemoryUsers(SharedStore);

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.0.lock().unwrap().users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .users
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }
}

pub struct InMemoryApiKeys(SharedStore);

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeys {
    async fn find_active_by_key(&self, key: &str) -> Result<Option<ApiKey>, ApiKeyError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .api_keys
            .iter()
            .find(|api_key| api_key.key == key && api_key.is_active)
            .cloned())
    }

    async fn increment_usage(&self, id: &ApiKeyId) -> Result<(), ApiKeyError> {
        let mut store = self.0.lock().unwrap();
        if let Some(api_key) = store.api_keys.iter_mut().find(|api_key| &api_key.id == id) {
            api_key.usage_count += 1;
            api_key.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn create(&self, key: &ApiKey) -> Result<(), ApiKeyError> {
        self.0.lock().unwrap().api_keys.push(key.clone());
        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<ApiKey>, ApiKeyError> {
        let mut keys: Vec<ApiKey> = self
            .0
            .lock()
            .unwrap()
            .api_keys
            .iter()
            .filter(|api_key| &api_key.user_id == user_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn delete(&self, user_id: &UserId, id: &ApiKeyId) -> Result<bool, ApiKeyError> {
        let mut store = self.0.lock().unwrap();
        let before = store.api_keys.len();
        store
            .api_keys
            .retain(|api_key| !(&api_key.id == id && &api_key.user_id == user_id));
        Ok(store.api_keys.len() < before)
    }
}

pub struct InMemoryResets(SharedStore);

/// Writes staged until commit; dropping it discards all of them.
struct InMemoryPendingReset {
    store: SharedStore,
    user: Option<User>,
    reset: PasswordReset,
    messages: Vec<EmailMessage>,
}

#[async_trait]
impl PendingReset for InMemoryPendingReset {
    fn reset(&self) -> &PasswordReset {
        &self.reset
    }

    async fn enqueue_email(&mut self, message: &EmailMessage) -> Result<(), PasswordResetError> {
        if self.store.lock().unwrap().fail_email {
            return Err(EmailDeliveryError::EnqueueFailed("outbox down".to_string()).into());
        }
        self.messages.push(message.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PasswordResetError> {
        let pending = *self;
        let mut store = pending.store.lock().unwrap();
        if let Some(user) = pending.user {
            store.users.insert(user.id, user);
        }
        store.resets.push(pending.reset);
        store.outbox.extend(pending.messages);
        Ok(())
    }
}

#[async_trait]
impl PasswordResetRepository for InMemoryResets {
    async fn begin_issue(
        &self,
        reset: PasswordReset,
    ) -> Result<Box<dyn PendingReset>, PasswordResetError> {
        Ok(Box::new(InMemoryPendingReset {
            store: Arc::clone(&self.0),
            user: None,
            reset,
            messages: Vec::new(),
        }))
    }

    async fn begin_registration(
        &self,
        user: &User,
        reset: PasswordReset,
    ) -> Result<Box<dyn PendingReset>, PasswordResetError> {
        let taken = self
            .0
            .lock()
            .unwrap()
            .users
            .values()
            .any(|existing| existing.email == user.email);
        if taken {
            return Err(PasswordResetError::EmailTaken);
        }

        Ok(Box::new(InMemoryPendingReset {
            store: Arc::clone(&self.0),
            user: Some(user.clone()),
            reset,
            messages: Vec::new(),
        }))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>, PasswordResetError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .resets
            .iter()
            .find(|reset| reset.token == token)
            .cloned())
    }

    async fn consume(
        &self,
        reset: &PasswordReset,
        password_hash: &str,
    ) -> Result<(), PasswordResetError> {
        let mut store = self.0.lock().unwrap();

        let record = store
            .resets
            .iter_mut()
            .find(|record| record.id == reset.id && record.is_active())
            .ok_or(PasswordResetError::AlreadyConsumed)?;
        record.status = ResetStatus::Inactive;

        let user = store
            .users
            .get_mut(&reset.user_id)
            .ok_or_else(|| PasswordResetError::DatabaseError("user vanished".to_string()))?;
        user.password_hash = Some(password_hash.to_string());
        user.status = UserStatus::Active;

        Ok(())
    }
}
