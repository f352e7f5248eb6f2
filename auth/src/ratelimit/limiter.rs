//! Per-client admission control.
//!
//! Each client identity owns a [`TokenBucket`]. The map of buckets is
//! read-mostly: lookups take the read lock and only the first request from
//! a new client takes the write lock. Each bucket sits behind its own mutex
//! so requests from different clients never contend.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;
use std::time::Instant;

use super::bucket::TokenBucket;

/// Configuration for the rate limiter
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Requests replenished per `per` window
    pub requests: u32,

    /// Window over which `requests` are replenished
    pub per: Duration,

    /// Bucket capacity (maximum burst)
    pub burst: u32,

    /// Buckets idle (and full) for this long are evicted by `sweep`
    pub idle_ttl: Duration,
}

impl RateLimitConfig {
    /// Tokens added to a bucket per second.
    pub fn refill_per_second(&self) -> f64 {
        let per = self.per.as_secs_f64();
        if per == 0.0 {
            return f64::from(self.requests);
        }
        f64::from(self.requests) / per
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 1000,
            per: Duration::from_secs(3600),
            burst: 20,
            idle_ttl: Duration::from_secs(3600),
        }
    }
}

/// Admission decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// Denied; a token becomes available after `retry_after`.
    Limited { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Token-bucket rate limiter keyed by client identity.
pub struct RateLimiter<K> {
    config: RateLimitConfig,
    buckets: RwLock<HashMap<K, Arc<Mutex<TokenBucket>>>>,
}

impl<K> RateLimiter<K>
where
    K: Eq + Hash + Clone,
{
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or deny one request from `client`.
    pub fn allow(&self, client: &K) -> bool {
        self.check_at(client, Instant::now()).is_allowed()
    }

    /// Same as [`Self::allow`] at an explicit instant.
    pub fn allow_at(&self, client: &K, now: Instant) -> bool {
        self.check_at(client, now).is_allowed()
    }

    /// Admit or deny one request, reporting how long a denied client should wait.
    pub fn check(&self, client: &K) -> Admission {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &K, now: Instant) -> Admission {
        let bucket = self.bucket_for(client, now);
        let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);

        if bucket.try_acquire(now) {
            Admission::Allowed
        } else {
            Admission::Limited {
                retry_after: bucket.time_until_available(now),
            }
        }
    }

    /// Evict buckets that are full and idle longer than `idle_ttl`.
    ///
    /// Returns the number of evicted clients.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let idle_ttl = self.config.idle_ttl;
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let before = buckets.len();

        buckets.retain(|_, bucket| {
            let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
            !bucket.is_idle(now, idle_ttl)
        });

        before - buckets.len()
    }

    /// Number of client identities currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn bucket_for(&self, client: &K, now: Instant) -> Arc<Mutex<TokenBucket>> {
        if let Some(bucket) = self
            .buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(client)
        {
            return Arc::clone(bucket);
        }

        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(client.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(TokenBucket::new(
                self.config.burst,
                self.config.refill_per_second(),
                now,
            )))
        });
        Arc::clone(bucket)
    }
}
