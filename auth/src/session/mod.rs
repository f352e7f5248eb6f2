pub mod config;
pub mod service;

pub use config::SessionConfig;
pub use service::IssuedToken;
pub use service::SessionTokenService;
pub use service::TokenPair;
