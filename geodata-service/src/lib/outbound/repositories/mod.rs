pub mod api_key;
pub mod password_reset;
pub mod user;

pub use api_key::PostgresApiKeyRepository;
pub use password_reset::PostgresPasswordResetRepository;
pub use user::PostgresUserRepository;
