pub mod bucket;
pub mod limiter;

pub use bucket::TokenBucket;
pub use limiter::Admission;
pub use limiter::RateLimitConfig;
pub use limiter::RateLimiter;
