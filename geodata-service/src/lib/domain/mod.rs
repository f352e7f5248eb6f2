pub mod api_key;
pub mod auth;
pub mod email;
pub mod password_reset;
pub mod user;
